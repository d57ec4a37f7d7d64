//! Image sinks: where a downloaded wallpaper is applied.

use crate::app_dirs::write_atomic;
use crate::error::{Result, WallpaperError};
use crate::fetcher::ImageBytes;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Placeholder in [`CommandSink`] arguments replaced by the written file path.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Consumer of downloaded images.
///
/// A failed apply is treated like a failed download: the last-seen value
/// is left untouched so the next cycle tries again.
#[async_trait]
pub trait ImageSink: Send + Sync {
    async fn apply(&self, image: &ImageBytes) -> Result<()>;
}

/// Writes the encoded image to `<dir>/wallpaper.<ext>`.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target path for `image`, extension taken from its detected format.
    pub fn path_for(&self, image: &ImageBytes) -> PathBuf {
        self.dir.join(format!("wallpaper.{}", image.extension()))
    }

    /// Write `image` and return the path written.
    ///
    /// # Errors
    ///
    /// Returns [`WallpaperError::Apply`] if the file cannot be written.
    pub async fn write(&self, image: &ImageBytes) -> Result<PathBuf> {
        let path = self.path_for(image);
        let target = path.clone();
        let encoded = image.encoded.clone();

        tokio::task::spawn_blocking(move || write_atomic(&target, &encoded))
            .await
            .map_err(|e| WallpaperError::Apply(format!("write task failed: {e}")))?
            .map_err(|e| {
                WallpaperError::Apply(format!("cannot write {}: {e}", path.display()))
            })?;

        debug!(path = %path.display(), "wallpaper file written");
        Ok(path)
    }
}

#[async_trait]
impl ImageSink for FileSink {
    async fn apply(&self, image: &ImageBytes) -> Result<()> {
        let path = self.write(image).await?;
        info!(path = %path.display(), "wallpaper saved");
        Ok(())
    }
}

/// Writes the image with a [`FileSink`], then runs a wallpaper-setting command.
#[derive(Debug, Clone)]
pub struct CommandSink {
    file: FileSink,
    command: Vec<String>,
}

impl CommandSink {
    /// `command[0]` is the program; each `{path}` in the arguments is
    /// replaced by the written file path.
    ///
    /// # Errors
    ///
    /// Returns [`WallpaperError::Config`] when `command` has no program.
    pub fn new(file: FileSink, command: Vec<String>) -> Result<Self> {
        if command.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(WallpaperError::Config(
                "wallpaper command must start with a program name".to_owned(),
            ));
        }
        Ok(Self { file, command })
    }

    fn argv_for(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        self.command
            .iter()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
            .collect()
    }
}

#[async_trait]
impl ImageSink for CommandSink {
    async fn apply(&self, image: &ImageBytes) -> Result<()> {
        let path = self.file.write(image).await?;
        let argv = self.argv_for(&path);
        let Some((program, args)) = argv.split_first() else {
            return Err(WallpaperError::Apply("empty wallpaper command".to_owned()));
        };

        debug!(%program, ?args, "running wallpaper command");
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| WallpaperError::Apply(format!("cannot run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WallpaperError::Apply(format!(
                "{program} exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        info!(path = %path.display(), %program, "wallpaper set");
        Ok(())
    }
}
