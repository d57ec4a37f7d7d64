//! Last-applied resource persistence.
//!
//! Holds a single key, `LAST_URL`: the resource ref of the most recently
//! applied wallpaper. The pipeline writes it only after a successful apply.

use crate::app_dirs::write_atomic;
use crate::error::{Result, WallpaperError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Durable storage for the last applied resource ref.
pub trait LastSeenStore: Send + Sync {
    /// Read the persisted value. `None` means nothing was ever applied.
    fn get(&self) -> Result<Option<String>>;

    /// Overwrite the persisted value.
    fn set(&self, value: &str) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LastSeenDocument {
    #[serde(rename = "LAST_URL", default)]
    last_url: Option<String>,
}

/// JSON-file backed [`LastSeenStore`].
///
/// Writes replace the file atomically, so a crash mid-write leaves the
/// previous value intact.
#[derive(Debug, Clone)]
pub struct FileLastSeenStore {
    path: PathBuf,
}

impl FileLastSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `app_dirs::last_seen_file()`.
    pub fn default_location() -> Self {
        Self::new(crate::app_dirs::last_seen_file())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl LastSeenStore for FileLastSeenStore {
    fn get(&self) -> Result<Option<String>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(WallpaperError::Store(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice::<LastSeenDocument>(&bytes) {
            Ok(doc) => Ok(doc.last_url),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    "ignoring unreadable last-seen state: {e}"
                );
                Ok(None)
            }
        }
    }

    fn set(&self, value: &str) -> Result<()> {
        let doc = LastSeenDocument {
            last_url: Some(value.to_owned()),
        };
        let json = serde_json::to_vec_pretty(&doc)
            .map_err(|e| WallpaperError::Store(format!("cannot serialize last-seen state: {e}")))?;
        write_atomic(&self.path, &json).map_err(|e| {
            WallpaperError::Store(format!("cannot write {}: {e}", self.path.display()))
        })
    }
}

/// In-process [`LastSeenStore`]; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryLastSeenStore {
    value: Mutex<Option<String>>,
}

impl MemoryLastSeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `value`.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }
}

impl LastSeenStore for MemoryLastSeenStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.value.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn set(&self, value: &str) -> Result<()> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(value.to_owned());
        Ok(())
    }
}
