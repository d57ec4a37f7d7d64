//! Application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/youpic-wallpaper/` | `~/.local/share/youpic-wallpaper/` |
//! | Config | `~/Library/Application Support/youpic-wallpaper/` | `~/.config/youpic-wallpaper/` |
//!
//! # Environment Overrides
//!
//! - `YOUPIC_WALLPAPER_DATA_DIR` overrides [`data_dir`]
//! - `YOUPIC_WALLPAPER_CONFIG_DIR` overrides [`config_dir`]

use std::ffi::OsString;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "youpic-wallpaper";

fn resolve(override_dir: Option<OsString>, base: Option<PathBuf>, fallback: &str) -> PathBuf {
    if let Some(dir) = override_dir {
        return PathBuf::from(dir);
    }
    base.map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| std::env::temp_dir().join(fallback))
}

/// Application data root directory.
///
/// Holds the persisted state files, the written wallpaper and logs.
#[must_use]
pub fn data_dir() -> PathBuf {
    resolve(
        std::env::var_os("YOUPIC_WALLPAPER_DATA_DIR"),
        dirs::data_dir(),
        "youpic-wallpaper-data",
    )
}

/// Application config directory (holds `config.toml`).
#[must_use]
pub fn config_dir() -> PathBuf {
    resolve(
        std::env::var_os("YOUPIC_WALLPAPER_CONFIG_DIR"),
        dirs::config_dir(),
        "youpic-wallpaper-config",
    )
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

fn state_dir() -> PathBuf {
    data_dir().join("state")
}

/// File holding the last applied resource URL.
#[must_use]
pub fn last_seen_file() -> PathBuf {
    state_dir().join("last-seen.json")
}

/// File holding the "re-arm after restart" flag.
#[must_use]
pub fn rearm_file() -> PathBuf {
    state_dir().join("schedule.json")
}

/// Directory the downloaded wallpaper is written to.
#[must_use]
pub fn wallpaper_dir() -> PathBuf {
    data_dir().join("wallpaper")
}

/// Write `contents` to a sibling temp file and rename it over `path`.
///
/// Readers never observe a half-written file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().map(OsString::from).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}
