//! YouPic wallpaper: keep the device wallpaper in sync with the YouPic
//! featured image.
//!
//! # Architecture
//!
//! A fetch run is one pass through [`FetchPipeline`]:
//! metadata → change check → download → decode → apply → record.
//!
//! - **Fetcher**: resolves the current image URL and downloads it via `reqwest`
//! - **Store**: remembers the last applied URL so unchanged images are skipped
//! - **Sink**: writes the image to disk and optionally hands it to a command
//! - **Scheduler**: repeats the run on a wall-clock period and re-arms after restart

pub mod app_dirs;
pub mod bitmap;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod pipeline;
pub mod scheduler;
pub mod service;
pub mod sink;
pub mod store;

pub use config::WallpaperConfig;
pub use error::{Result, WallpaperError};
pub use fetcher::{HttpFetcher, ImageBytes, ResourceRef};
pub use pipeline::{FetchOutcome, FetchPipeline, SkipReason};
pub use scheduler::Scheduler;
pub use service::WallpaperService;
