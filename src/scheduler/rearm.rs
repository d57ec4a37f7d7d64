//! Restart re-arm flag.
//!
//! Timers do not survive a process or device restart, so the scheduler
//! persists whether it was left active. Restart handling reads the flag and
//! re-registers the trigger when it is set.

use crate::app_dirs::write_atomic;
use crate::error::{Result, WallpaperError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Durable "re-arm on restart" flag.
pub trait RearmStore: Send + Sync {
    fn is_enabled(&self) -> Result<bool>;
    fn set_enabled(&self, enabled: bool) -> Result<()>;

    /// When the flag last changed, if the store records it.
    fn changed_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RearmDocument {
    enabled: bool,
    changed_at: DateTime<Utc>,
}

/// JSON-file backed [`RearmStore`]. A missing file means disabled.
#[derive(Debug, Clone)]
pub struct FileRearmStore {
    path: PathBuf,
}

impl FileRearmStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `app_dirs::rearm_file()`.
    pub fn default_location() -> Self {
        Self::new(crate::app_dirs::rearm_file())
    }

    fn read(&self) -> Result<Option<RearmDocument>> {
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
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            WallpaperError::Store(format!("cannot parse {}: {e}", self.path.display()))
        })
    }
}

impl RearmStore for FileRearmStore {
    fn is_enabled(&self) -> Result<bool> {
        Ok(self.read()?.is_some_and(|doc| doc.enabled))
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        let doc = RearmDocument {
            enabled,
            changed_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&doc)
            .map_err(|e| WallpaperError::Store(format!("cannot serialize schedule state: {e}")))?;
        write_atomic(&self.path, &json).map_err(|e| {
            WallpaperError::Store(format!("cannot write {}: {e}", self.path.display()))
        })
    }

    fn changed_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read()?.map(|doc| doc.changed_at))
    }
}

/// In-process [`RearmStore`].
#[derive(Debug, Default)]
pub struct MemoryRearmStore {
    enabled: AtomicBool,
}

impl MemoryRearmStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RearmStore for MemoryRearmStore {
    fn is_enabled(&self) -> Result<bool> {
        Ok(self.enabled.load(Ordering::SeqCst))
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}
