//! Repeating trigger registrations.
//!
//! A [`Trigger`] owns at most one registration. Arming replaces any
//! existing registration; "is armed" is read from the registration itself,
//! never from a separately tracked flag.

use crate::error::{Result, WallpaperError};
use futures_util::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Callback run on every fire.
pub type TickHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A repeating timer registration.
pub trait Trigger: Send + Sync {
    /// Register `on_tick` to fire every `period`, replacing any existing registration.
    fn arm(&self, period: Duration, on_tick: TickHandler) -> Result<()>;

    /// Cancel the registration. Returns `true` if one existed.
    fn disarm(&self) -> bool;

    /// Whether a registration currently exists.
    fn is_armed(&self) -> bool;
}

/// Returns `true` once the wall clock has reached `due`.
pub(crate) fn is_due(now: SystemTime, due: SystemTime) -> bool {
    now >= due
}

/// Wall-clock repeating trigger on the tokio runtime.
///
/// The clock is checked every `poll` interval and the handler fires once the
/// due time has passed, so fires missed while the machine slept happen on
/// wake. The first due time is the epoch: arming fires right away.
/// Disarming stops future fires; a fire already running completes.
pub struct WallClockTrigger {
    poll: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WallClockTrigger {
    pub fn new(poll: Duration) -> Self {
        Self {
            poll: poll.max(Duration::from_millis(1)),
            task: Mutex::new(None),
        }
    }
}

/// Each fire runs on its own task, so cancelling the loop never cuts a run short.
async fn fire_loop(period: Duration, poll: Duration, on_tick: TickHandler) {
    // None: the next fire lies past the representable clock range.
    let mut next_due = Some(UNIX_EPOCH);
    let mut interval = tokio::time::interval(poll);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let now = SystemTime::now();
        if !next_due.is_some_and(|due| is_due(now, due)) {
            continue;
        }
        next_due = now.checked_add(period);
        if next_due.is_none() {
            warn!(period_secs = period.as_secs(), "period overflows the clock, no further fires");
        }
        debug!("trigger fired");
        tokio::spawn(on_tick());
    }
}

impl Trigger for WallClockTrigger {
    fn arm(&self, period: Duration, on_tick: TickHandler) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            WallpaperError::Scheduler(format!("no async runtime to host the trigger: {e}"))
        })?;

        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
        }
        *task = Some(runtime.spawn(fire_loop(period, self.poll, on_tick)));
        Ok(())
    }

    fn disarm(&self) -> bool {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        match task.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn is_armed(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for WallClockTrigger {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Trigger whose fires are driven by the host through [`ManualTrigger::fire`].
///
/// Suits hosts that already own a timer (cron, systemd timers) and tests.
#[derive(Default)]
pub struct ManualTrigger {
    registration: Mutex<Option<(Duration, TickHandler)>>,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Period of the current registration.
    pub fn period(&self) -> Option<Duration> {
        self.registration
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|(period, _)| *period)
    }

    /// Run the registered handler once. Returns `false` when not armed.
    pub async fn fire(&self) -> bool {
        let handler = self
            .registration
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|(_, handler)| Arc::clone(handler));

        match handler {
            Some(handler) => {
                handler().await;
                true
            }
            None => false,
        }
    }
}

impl Trigger for ManualTrigger {
    fn arm(&self, period: Duration, on_tick: TickHandler) -> Result<()> {
        *self.registration.lock().unwrap_or_else(|e| e.into_inner()) = Some((period, on_tick));
        Ok(())
    }

    fn disarm(&self) -> bool {
        self.registration
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some()
    }

    fn is_armed(&self) -> bool {
        self.registration
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
