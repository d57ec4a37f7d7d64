//! Periodic fetch scheduling.
//!
//! A [`Scheduler`] owns one repeating [`Trigger`] registration and a
//! persisted re-arm flag, so a restart can register the trigger again.

pub mod rearm;
pub mod runner;
pub mod trigger;

pub use rearm::{FileRearmStore, MemoryRearmStore, RearmStore};
pub use runner::{DEFAULT_PERIOD, Scheduler};
pub use trigger::{ManualTrigger, TickHandler, Trigger, WallClockTrigger};
