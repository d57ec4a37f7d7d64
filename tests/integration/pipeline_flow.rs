//! Fetch pipeline dedupe and persistence behaviour with a file-backed store.

use crate::helpers::{RecordingSink, ScriptedSource};
use std::sync::Arc;
use youpic_wallpaper::store::{FileLastSeenStore, LastSeenStore};
use youpic_wallpaper::{FetchOutcome, FetchPipeline, SkipReason, WallpaperError};

struct Fixture {
    _temp: tempfile::TempDir,
    source: Arc<ScriptedSource>,
    store: Arc<FileLastSeenStore>,
    sink: Arc<RecordingSink>,
    pipeline: Arc<FetchPipeline>,
}

fn fixture(urls: &[&str], last_seen: Option<&str>, sink: RecordingSink) -> Fixture {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileLastSeenStore::new(temp.path().join("last-seen.json")));
    if let Some(value) = last_seen {
        store.set(value).expect("seed store");
    }
    let source = Arc::new(ScriptedSource::new(urls.iter().copied()));
    let sink = Arc::new(sink);
    let pipeline = Arc::new(FetchPipeline::new(
        source.clone(),
        store.clone(),
        sink.clone(),
    ));
    Fixture {
        _temp: temp,
        source,
        store,
        sink,
        pipeline,
    }
}

#[tokio::test]
async fn unchanged_url_skips_without_download_or_apply() {
    let f = fixture(
        &["https://x/img1.jpg"],
        Some("https://x/img1.jpg"),
        RecordingSink::default(),
    );

    let outcome = f.pipeline.run().await;

    assert!(matches!(
        outcome,
        FetchOutcome::Skipped(SkipReason::AlreadyCurrent)
    ));
    assert!(f.source.downloads().is_empty());
    assert_eq!(f.sink.applied(), 0);
    assert_eq!(
        f.store.get().unwrap().as_deref(),
        Some("https://x/img1.jpg")
    );
}

#[tokio::test]
async fn failed_download_leaves_store_untouched() {
    let f = fixture(&["https://x/B.jpg"], Some("https://x/A.jpg"), RecordingSink::default());
    f.source.fail_downloads(true);

    let outcome = f.pipeline.run().await;

    assert!(matches!(outcome, FetchOutcome::Failed(WallpaperError::Network(_))));
    assert_eq!(f.sink.applied(), 0);
    assert_eq!(f.store.get().unwrap().as_deref(), Some("https://x/A.jpg"));
}

#[tokio::test]
async fn failed_apply_leaves_store_untouched_and_retries() {
    let f = fixture(&["https://x/B.jpg"], None, RecordingSink::failing());

    let first = f.pipeline.run().await;
    assert!(matches!(first, FetchOutcome::Failed(WallpaperError::Apply(_))));
    assert_eq!(f.store.get().unwrap(), None);

    // Same URL again: nothing was recorded, so it is downloaded again.
    let second = f.pipeline.run().await;
    assert!(second.is_failure());
    assert_eq!(
        f.source.downloads(),
        vec!["https://x/B.jpg".to_owned(), "https://x/B.jpg".to_owned()]
    );
}

#[tokio::test]
async fn first_successful_cycle_records_url() {
    let f = fixture(&["https://x/img1.jpg"], None, RecordingSink::default());

    let outcome = f.pipeline.run().await;

    assert!(matches!(&outcome, FetchOutcome::Applied(r) if r.as_str() == "https://x/img1.jpg"));
    assert_eq!(f.sink.applied(), 1);
    assert_eq!(
        f.store.get().unwrap().as_deref(),
        Some("https://x/img1.jpg")
    );
}

#[tokio::test]
async fn new_url_replaces_previous_value() {
    let f = fixture(&["https://x/B.jpg"], Some("https://x/A.jpg"), RecordingSink::default());

    let outcome = f.pipeline.run().await;

    assert!(outcome.is_applied());
    assert_eq!(f.source.downloads(), vec!["https://x/B.jpg".to_owned()]);
    assert_eq!(f.store.get().unwrap().as_deref(), Some("https://x/B.jpg"));
}

#[tokio::test]
async fn sequence_of_publications_applies_each_change_once() {
    let f = fixture(
        &[
            "https://x/1.jpg",
            "https://x/1.jpg",
            "https://x/2.jpg",
            "https://x/2.jpg",
        ],
        None,
        RecordingSink::default(),
    );

    let mut notices = Vec::new();
    for _ in 0..4 {
        notices.push(f.pipeline.run().await.user_notice());
    }

    assert_eq!(
        notices,
        vec![
            "Successfully set wallpaper",
            "Already downloaded",
            "Successfully set wallpaper",
            "Already downloaded",
        ]
    );
    assert_eq!(f.sink.applied(), 2);
}

#[tokio::test]
async fn store_value_survives_reopen() {
    let f = fixture(&["https://x/img1.jpg"], None, RecordingSink::default());
    assert!(f.pipeline.run().await.is_applied());

    let reopened = FileLastSeenStore::new(f.store.path());
    assert_eq!(
        reopened.get().unwrap().as_deref(),
        Some("https://x/img1.jpg")
    );
}

#[tokio::test]
async fn manual_fetch_reports_through_callback() {
    let f = fixture(&["https://x/img1.jpg"], None, RecordingSink::default());
    let (tx, rx) = tokio::sync::oneshot::channel();

    f.pipeline
        .fetch_wallpaper(move |outcome| {
            let _ = tx.send(outcome.user_notice());
        })
        .await
        .expect("join");

    assert_eq!(rx.await.unwrap(), "Successfully set wallpaper");
}
