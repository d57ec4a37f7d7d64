//! Tracing subscriber setup.
//!
//! Logs go to stderr and, when enabled, to a daily-rolling file in
//! `app_dirs::logs_dir()`. `RUST_LOG` overrides the configured level.

use crate::config::LoggingConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE_PREFIX: &str = "youpic-wallpaper.log";

/// Filter directives for `level`, keeping HTTP internals quiet.
pub fn default_directives(level: &str) -> String {
    format!("youpic_wallpaper={level},reqwest=warn,hyper=warn,hyper_util=warn")
}

fn file_appender(dir: &Path) -> std::io::Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .map_err(std::io::Error::other)
}

/// Install the global subscriber.
///
/// Returns the file writer guard; keep it alive for the life of the
/// process or buffered lines are lost. Calling this twice is a no-op.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let mut file_error = None;
    let (file_writer, guard) = if config.file {
        match file_appender(&crate::app_dirs::logs_dir()) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (Some(writer), Some(guard))
            }
            Err(e) => {
                file_error = Some(e);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    let file_layer = file_writer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .is_ok();

    if let Some(e) = file_error {
        tracing::warn!("file logging disabled: {e}");
    }
    if !installed {
        tracing::debug!("tracing subscriber already installed");
    }

    guard
}
