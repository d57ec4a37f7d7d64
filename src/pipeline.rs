//! Fetch-and-dedupe pipeline.
//!
//! One run: resolve the current resource ref, compare it with the last
//! applied value, and only on change download, apply and record it.
//! The last-seen value is written strictly after a successful apply, so a
//! failed download or apply is retried on the next run.

use crate::error::{Result, WallpaperError};
use crate::fetcher::{ImageSource, ResourceRef};
use crate::sink::ImageSink;
use crate::store::LastSeenStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Why a run did no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The published image is the one applied last.
    AlreadyCurrent,
    /// Another run was in progress.
    AlreadyRunning,
}

/// Result of one pipeline run.
#[derive(Debug)]
pub enum FetchOutcome {
    Skipped(SkipReason),
    Applied(ResourceRef),
    Failed(WallpaperError),
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short text for an interactive user. Failures are not broken down by kind.
    pub fn user_notice(&self) -> &'static str {
        match self {
            Self::Skipped(SkipReason::AlreadyCurrent) => "Already downloaded",
            Self::Skipped(SkipReason::AlreadyRunning) => "Download already in progress",
            Self::Applied(_) => "Successfully set wallpaper",
            Self::Failed(_) => "Could not update wallpaper",
        }
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        match self {
            Self::Skipped(SkipReason::AlreadyCurrent) => "skipped: already current".to_owned(),
            Self::Skipped(SkipReason::AlreadyRunning) => "skipped: run in progress".to_owned(),
            Self::Applied(resource) => format!("applied {resource}"),
            Self::Failed(e) => format!("failed: {e}"),
        }
    }
}

/// Clears the running flag when a run ends, however it ends.
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Orchestrates resolve → compare → download → apply → record.
pub struct FetchPipeline {
    source: Arc<dyn ImageSource>,
    store: Arc<dyn LastSeenStore>,
    sink: Arc<dyn ImageSink>,
    running: AtomicBool,
}

impl FetchPipeline {
    pub fn new(
        source: Arc<dyn ImageSource>,
        store: Arc<dyn LastSeenStore>,
        sink: Arc<dyn ImageSink>,
    ) -> Self {
        Self {
            source,
            store,
            sink,
            running: AtomicBool::new(false),
        }
    }

    /// `true` while a run is executing.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Execute one run. Overlapping calls return `Skipped(AlreadyRunning)`
    /// immediately instead of queueing.
    pub async fn run(&self) -> FetchOutcome {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            debug!("fetch already in progress, dropping trigger");
            return FetchOutcome::Skipped(SkipReason::AlreadyRunning);
        };

        match self.run_cycle().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "wallpaper fetch failed");
                FetchOutcome::Failed(e)
            }
        }
    }

    async fn run_cycle(&self) -> Result<FetchOutcome> {
        let resource = self.source.resolve_resource_ref().await?;

        let last_seen = self.store.get()?;
        if last_seen.as_deref() == Some(resource.as_str()) {
            info!(url = %resource, "already downloaded");
            return Ok(FetchOutcome::Skipped(SkipReason::AlreadyCurrent));
        }

        debug!(
            url = %resource,
            previous = last_seen.as_deref().unwrap_or("<none>"),
            "new image published"
        );
        let image = self.source.download(&resource).await?;
        self.sink.apply(&image).await?;

        if let Err(e) = self.store.set(resource.as_str()) {
            warn!(url = %resource, "wallpaper applied but could not be recorded");
            return Err(e);
        }

        info!(url = %resource, "wallpaper updated");
        Ok(FetchOutcome::Applied(resource))
    }

    /// Manual trigger: run in the background and hand the outcome to `on_complete`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch_wallpaper<F>(self: &Arc<Self>, on_complete: F) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce(FetchOutcome) + Send + 'static,
    {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = pipeline.run().await;
            on_complete(outcome);
        })
    }
}
