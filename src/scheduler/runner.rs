//! Periodic wallpaper scheduler.
//!
//! `Inactive → start() → Active → stop() → Inactive`. Activity is read
//! from the trigger registration; the re-arm flag only records whether a
//! restart should register the trigger again.

use crate::error::Result;
use crate::pipeline::{FetchOutcome, FetchPipeline, SkipReason};
use crate::scheduler::rearm::RearmStore;
use crate::scheduler::trigger::{TickHandler, Trigger};
use futures_util::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Time between scheduled fetches.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(3 * 3600);

/// Owns the repeating trigger registration and its restart contract.
pub struct Scheduler {
    pipeline: Arc<FetchPipeline>,
    trigger: Arc<dyn Trigger>,
    rearm: Arc<dyn RearmStore>,
    period: Duration,
    /// Receives every scheduled run's outcome, when set.
    outcome_tx: Option<mpsc::UnboundedSender<FetchOutcome>>,
}

impl Scheduler {
    pub fn new(
        pipeline: Arc<FetchPipeline>,
        trigger: Arc<dyn Trigger>,
        rearm: Arc<dyn RearmStore>,
    ) -> Self {
        Self {
            pipeline,
            trigger,
            rearm,
            period: DEFAULT_PERIOD,
            outcome_tx: None,
        }
    }

    /// Override the fetch period.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Forward scheduled outcomes to `tx`.
    pub fn with_outcome_channel(mut self, tx: mpsc::UnboundedSender<FetchOutcome>) -> Self {
        self.outcome_tx = Some(tx);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn pipeline(&self) -> &Arc<FetchPipeline> {
        &self.pipeline
    }

    /// Persist the re-arm flag and register the repeating trigger.
    ///
    /// Starting while active replaces the registration.
    ///
    /// # Errors
    ///
    /// Fails if the flag cannot be persisted, leaving any existing
    /// registration untouched, or if the trigger cannot be registered, in
    /// which case the flag is cleared again unless a registration remains.
    pub fn start(&self) -> Result<()> {
        self.rearm.set_enabled(true)?;

        if let Err(e) = self.trigger.arm(self.period, self.tick_handler()) {
            if !self.trigger.is_armed() {
                if let Err(flag_err) = self.rearm.set_enabled(false) {
                    warn!(error = %flag_err, "cannot clear re-arm flag after failed start");
                }
            }
            return Err(e);
        }

        info!(period_secs = self.period.as_secs(), "wallpaper schedule started");
        Ok(())
    }

    /// Cancel the trigger and clear the re-arm flag.
    ///
    /// # Errors
    ///
    /// Fails if the cleared flag cannot be persisted. The trigger is
    /// cancelled regardless.
    pub fn stop(&self) -> Result<()> {
        let was_armed = self.trigger.disarm();
        self.rearm.set_enabled(false)?;
        info!(was_armed, "wallpaper schedule stopped");
        Ok(())
    }

    /// Whether a trigger registration currently exists.
    pub fn is_active(&self) -> bool {
        self.trigger.is_armed()
    }

    /// Whether a restart would re-arm the trigger.
    ///
    /// # Errors
    ///
    /// Fails if the persisted flag cannot be read.
    pub fn is_rearm_enabled(&self) -> Result<bool> {
        self.rearm.is_enabled()
    }

    /// Restart hook: re-arm the trigger if the schedule was left active.
    ///
    /// Returns whether the trigger was re-armed.
    ///
    /// # Errors
    ///
    /// Fails if the flag cannot be read or re-arming fails.
    pub fn handle_restart(&self) -> Result<bool> {
        if !self.rearm.is_enabled()? {
            debug!("schedule was not active before restart");
            return Ok(false);
        }

        self.start()?;
        info!("wallpaper schedule re-armed after restart");
        Ok(true)
    }

    /// Wait until the re-arm flag is cleared, then cancel the trigger.
    ///
    /// The flag is checked every `check_every`, so a `stop()` issued by
    /// another process ends this process's schedule. Read failures are
    /// logged and checked again on the next round.
    pub async fn run_until_disabled(&self, check_every: Duration) {
        let mut interval = tokio::time::interval(check_every.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match self.rearm.is_enabled() {
                Ok(true) => {}
                Ok(false) => {
                    let was_armed = self.trigger.disarm();
                    info!(was_armed, "re-arm flag cleared, wallpaper schedule stopped");
                    return;
                }
                Err(e) => warn!(error = %e, "cannot read re-arm flag"),
            }
        }
    }

    fn tick_handler(&self) -> TickHandler {
        let pipeline = Arc::clone(&self.pipeline);
        let outcome_tx = self.outcome_tx.clone();

        Arc::new(move || {
            let pipeline = Arc::clone(&pipeline);
            let outcome_tx = outcome_tx.clone();
            async move {
                debug!("scheduled fetch triggered");
                let outcome = pipeline.run().await;
                log_outcome(&outcome);

                if let Some(tx) = outcome_tx {
                    if tx.send(outcome).is_err() {
                        debug!("outcome channel closed");
                    }
                }
            }
            .boxed()
        })
    }
}

fn log_outcome(outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Applied(resource) => info!(url = %resource, "scheduled fetch applied"),
        FetchOutcome::Skipped(SkipReason::AlreadyCurrent) => {
            info!("scheduled fetch skipped, wallpaper already current");
        }
        FetchOutcome::Skipped(SkipReason::AlreadyRunning) => {
            debug!("scheduled fetch skipped, another run in progress");
        }
        FetchOutcome::Failed(e) => {
            warn!(kind = e.kind(), error = %e, "scheduled fetch failed, waiting for next tick");
        }
    }
}
