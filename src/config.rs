//! Configuration types for the wallpaper fetcher.

use crate::error::{Result, WallpaperError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Metadata endpoint publishing the current image.
pub const DEFAULT_METADATA_URL: &str = "https://api.youpic.com/web_image";

/// Upper bound for `schedule.interval_secs` and `schedule.poll_secs` (one year).
pub const MAX_SCHEDULE_SECS: u64 = 365 * 24 * 3600;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WallpaperConfig {
    /// Where the current image is published.
    pub source: SourceConfig,
    /// HTTP client settings.
    pub http: HttpConfig,
    /// Repeating trigger settings.
    pub schedule: ScheduleConfig,
    /// Where downloaded images go.
    pub sink: SinkConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Metadata source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON endpoint whose `image_urls.huge` field names the current image.
    pub metadata_url: String,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            metadata_url: DEFAULT_METADATA_URL.to_owned(),
            user_agent: format!("youpic-wallpaper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds, applied to each network call.
    pub timeout_secs: u64,
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Repeating trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between fetches.
    pub interval_secs: u64,
    /// How often the wall clock is checked for a due fetch.
    pub poll_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3 * 3600,
            poll_secs: 60,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }
}

/// Image sink configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Directory the wallpaper file is written to (None = `app_dirs::wallpaper_dir()`).
    pub output_dir: Option<PathBuf>,
    /// Command run after each write to set the desktop wallpaper.
    ///
    /// Every `{path}` in an argument is replaced by the written file path,
    /// e.g. `["feh", "--bg-fill", "{path}"]`.
    pub command: Option<Vec<String>>,
}

impl SinkConfig {
    pub fn effective_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(crate::app_dirs::wallpaper_dir)
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset.
    pub level: String,
    /// Also write a daily-rolling log file under `app_dirs::logs_dir()`.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: true,
        }
    }
}

impl WallpaperConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| WallpaperError::Config(e.to_string()))
    }

    /// Load from `path` when it exists, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| WallpaperError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        crate::app_dirs::config_file()
    }

    /// Reject values the fetcher cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`WallpaperError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.source.metadata_url).map_err(|e| {
            WallpaperError::Config(format!(
                "source.metadata_url '{}' is not a URL: {e}",
                self.source.metadata_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WallpaperError::Config(format!(
                "source.metadata_url must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(WallpaperError::Config(
                "http.timeout_secs must be greater than zero".to_owned(),
            ));
        }
        for (field, secs) in [
            ("schedule.interval_secs", self.schedule.interval_secs),
            ("schedule.poll_secs", self.schedule.poll_secs),
        ] {
            if secs == 0 || secs > MAX_SCHEDULE_SECS {
                return Err(WallpaperError::Config(format!(
                    "{field} must be between 1 and {MAX_SCHEDULE_SECS}, got {secs}"
                )));
            }
        }
        if let Some(command) = &self.sink.command {
            if command.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(WallpaperError::Config(
                    "sink.command must start with a program name".to_owned(),
                ));
            }
        }
        Ok(())
    }
}
