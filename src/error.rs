//! Error types for the wallpaper fetcher.

/// Top-level error type for fetching, applying and scheduling wallpapers.
#[derive(Debug, thiserror::Error)]
pub enum WallpaperError {
    /// Connection failure, timeout or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// Metadata response missing or malforming `image_urls.huge`.
    #[error("parse error: {0}")]
    Parse(String),

    /// Downloaded bytes could not be decoded as an image.
    #[error("decode error: {0}")]
    Decode(String),

    /// The image sink failed to apply the wallpaper.
    #[error("apply error: {0}")]
    Apply(String),

    /// Last-seen or re-arm state could not be read or written.
    #[error("store error: {0}")]
    Store(String),

    /// Trigger registration error.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WallpaperError {
    /// Stable lowercase label for structured log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Decode(_) => "decode",
            Self::Apply(_) => "apply",
            Self::Store(_) => "store",
            Self::Scheduler(_) => "scheduler",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, WallpaperError>;
