//! Scheduler start/stop and restart re-arm with a file-backed flag.

use crate::helpers::{GatedSource, RecordingSink, ScriptedSource};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use youpic_wallpaper::scheduler::{
    FileRearmStore, ManualTrigger, RearmStore, Scheduler, WallClockTrigger,
};
use youpic_wallpaper::store::{LastSeenStore, MemoryLastSeenStore};
use youpic_wallpaper::{FetchOutcome, FetchPipeline};

fn pipeline() -> Arc<FetchPipeline> {
    Arc::new(FetchPipeline::new(
        Arc::new(ScriptedSource::new(["https://x/img1.jpg"])),
        Arc::new(MemoryLastSeenStore::new()),
        Arc::new(RecordingSink::default()),
    ))
}

/// A fresh process: new trigger, new scheduler, same flag file.
fn boot(flag: &Path) -> (Scheduler, Arc<ManualTrigger>) {
    let trigger = Arc::new(ManualTrigger::new());
    let scheduler = Scheduler::new(
        pipeline(),
        trigger.clone(),
        Arc::new(FileRearmStore::new(flag)),
    );
    (scheduler, trigger)
}

#[test]
fn started_schedule_is_rearmed_after_restart() {
    let temp = tempfile::tempdir().expect("tempdir");
    let flag = temp.path().join("schedule.json");

    let (before, _) = boot(&flag);
    before.start().unwrap();
    assert!(before.is_active());
    drop(before);

    let (after, trigger) = boot(&flag);
    assert!(!after.is_active());
    assert!(after.handle_restart().unwrap());
    assert!(after.is_active());
    assert_eq!(trigger.period(), Some(after.period()));
}

#[test]
fn stopped_schedule_is_not_rearmed_after_restart() {
    let temp = tempfile::tempdir().expect("tempdir");
    let flag = temp.path().join("schedule.json");

    let (before, _) = boot(&flag);
    before.start().unwrap();
    before.stop().unwrap();
    assert!(!before.is_active());
    drop(before);

    let (after, _) = boot(&flag);
    assert!(!after.handle_restart().unwrap());
    assert!(!after.is_active());
    assert!(!FileRearmStore::new(&flag).is_enabled().unwrap());
}

#[test]
fn never_started_schedule_stays_inactive() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (scheduler, _) = boot(&temp.path().join("schedule.json"));

    assert!(!scheduler.handle_restart().unwrap());
    assert!(!scheduler.is_active());
    assert!(!scheduler.is_rearm_enabled().unwrap());
}

#[tokio::test]
async fn ticks_run_the_pipeline_until_stopped() {
    let temp = tempfile::tempdir().expect("tempdir");
    let trigger = Arc::new(ManualTrigger::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(
        pipeline(),
        trigger.clone(),
        Arc::new(FileRearmStore::new(temp.path().join("schedule.json"))),
    )
    .with_outcome_channel(tx);

    scheduler.start().unwrap();
    assert!(trigger.fire().await);
    assert!(trigger.fire().await);

    assert!(rx.recv().await.unwrap().is_applied());
    assert!(matches!(rx.recv().await.unwrap(), FetchOutcome::Skipped(_)));

    scheduler.stop().unwrap();
    assert!(!trigger.fire().await);
}

#[tokio::test]
async fn wall_clock_trigger_fires_immediately_and_stops() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(
        pipeline(),
        Arc::new(WallClockTrigger::new(Duration::from_millis(10))),
        Arc::new(FileRearmStore::new(temp.path().join("schedule.json"))),
    )
    .with_period(Duration::from_secs(3600))
    .with_outcome_channel(tx);

    scheduler.start().unwrap();
    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("first tick within timeout")
        .expect("outcome");
    assert!(first.is_applied());
    assert!(scheduler.is_active());

    scheduler.stop().unwrap();
    assert!(!scheduler.is_active());
}

#[tokio::test]
async fn stop_during_a_download_lets_the_run_finish() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = Arc::new(GatedSource::new("https://x/slow.jpg"));
    let store = Arc::new(MemoryLastSeenStore::new());
    let sink = Arc::new(RecordingSink::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(
        Arc::new(FetchPipeline::new(source.clone(), store.clone(), sink.clone())),
        Arc::new(WallClockTrigger::new(Duration::from_millis(10))),
        Arc::new(FileRearmStore::new(temp.path().join("schedule.json"))),
    )
    .with_outcome_channel(tx);

    scheduler.start().unwrap();
    tokio::time::timeout(Duration::from_secs(5), source.entered.notified())
        .await
        .expect("download started");

    scheduler.stop().unwrap();
    assert!(!scheduler.is_active());
    source.release.notify_one();

    let outcome = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("run finished")
        .expect("outcome");
    assert!(outcome.is_applied());
    assert_eq!(sink.applied(), 1);
    assert_eq!(store.get().unwrap().as_deref(), Some("https://x/slow.jpg"));
}

#[tokio::test]
async fn flag_cleared_by_another_process_ends_a_running_schedule() {
    let temp = tempfile::tempdir().expect("tempdir");
    let flag = temp.path().join("schedule.json");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let serving = Scheduler::new(
        pipeline(),
        Arc::new(WallClockTrigger::new(Duration::from_millis(10))),
        Arc::new(FileRearmStore::new(&flag)),
    )
    .with_period(Duration::from_millis(50))
    .with_outcome_channel(tx);

    serving.start().unwrap();
    assert!(rx.recv().await.is_some());

    // A separate process: its own trigger, never armed, same flag file.
    let (other, _) = boot(&flag);
    other.stop().unwrap();

    tokio::time::timeout(
        Duration::from_secs(5),
        serving.run_until_disabled(Duration::from_millis(10)),
    )
    .await
    .expect("schedule noticed the cleared flag");
    assert!(!serving.is_active());

    // Let fires started before the flag was noticed finish, then expect silence.
    tokio::time::sleep(Duration::from_millis(100)).await;
    while rx.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
}
