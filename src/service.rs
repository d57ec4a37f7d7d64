//! Wires fetcher, stores, sink, pipeline and scheduler from configuration.

use crate::config::WallpaperConfig;
use crate::error::Result;
use crate::fetcher::HttpFetcher;
use crate::pipeline::FetchPipeline;
use crate::scheduler::{FileRearmStore, RearmStore, Scheduler, WallClockTrigger};
use crate::sink::{CommandSink, FileSink, ImageSink};
use crate::store::{FileLastSeenStore, LastSeenStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Fully wired wallpaper service.
pub struct WallpaperService {
    pipeline: Arc<FetchPipeline>,
    scheduler: Scheduler,
    last_seen: Arc<dyn LastSeenStore>,
    rearm: Arc<dyn RearmStore>,
}

impl WallpaperService {
    /// Build the production stack with state files in their default locations.
    ///
    /// # Errors
    ///
    /// Fails when `config` is invalid or the HTTP client cannot be built.
    pub fn from_config(config: &WallpaperConfig) -> Result<Self> {
        Self::with_stores(
            config,
            Arc::new(FileLastSeenStore::default_location()),
            Arc::new(FileRearmStore::default_location()),
        )
    }

    /// Build with caller-supplied state stores.
    ///
    /// # Errors
    ///
    /// Fails when `config` is invalid or the HTTP client cannot be built.
    pub fn with_stores(
        config: &WallpaperConfig,
        last_seen: Arc<dyn LastSeenStore>,
        rearm: Arc<dyn RearmStore>,
    ) -> Result<Self> {
        config.validate()?;

        let fetcher = Arc::new(HttpFetcher::new(&config.source, &config.http)?);
        let file_sink = FileSink::new(config.sink.effective_output_dir());
        let sink: Arc<dyn ImageSink> = match &config.sink.command {
            Some(command) => Arc::new(CommandSink::new(file_sink, command.clone())?),
            None => Arc::new(file_sink),
        };

        let pipeline = Arc::new(FetchPipeline::new(fetcher, Arc::clone(&last_seen), sink));
        let scheduler = Scheduler::new(
            Arc::clone(&pipeline),
            Arc::new(WallClockTrigger::new(config.schedule.poll())),
            Arc::clone(&rearm),
        )
        .with_period(config.schedule.interval());

        Ok(Self {
            pipeline,
            scheduler,
            last_seen,
            rearm,
        })
    }

    pub fn pipeline(&self) -> &Arc<FetchPipeline> {
        &self.pipeline
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Last applied resource URL, if any.
    ///
    /// # Errors
    ///
    /// Fails when the last-seen store cannot be read.
    pub fn last_applied(&self) -> Result<Option<String>> {
        self.last_seen.get()
    }

    /// Whether a restart would re-arm the schedule.
    ///
    /// # Errors
    ///
    /// Fails when the re-arm flag cannot be read.
    pub fn rearm_enabled(&self) -> Result<bool> {
        self.rearm.is_enabled()
    }

    /// When the re-arm flag was last written, if known.
    ///
    /// # Errors
    ///
    /// Fails when the re-arm flag cannot be read.
    pub fn rearm_changed_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.rearm.changed_at()
    }
}
