//! The panel on the real [`TokioScheduler`], with tokio's clock paused so
//! the 3-second interval elapses instantly.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use common::{FakeBackend, RecordingNotifier};
use jobwatch_core::{MigrationStatus, NotificationKind};
use jobwatch_panel::{PanelController, TokioScheduler, DEFAULT_POLL_INTERVAL};
use jobwatch_store::{MemoryStore, MigrationHistory};

fn panel(backend: Arc<FakeBackend>, notifier: Arc<RecordingNotifier>) -> PanelController {
    PanelController::new(
        backend,
        MigrationHistory::new(Arc::new(MemoryStore::new())),
        notifier,
        Arc::new(TokioScheduler),
        DEFAULT_POLL_INTERVAL,
    )
}

#[tokio::test(start_paused = true)]
async fn completes_on_first_tick_after_interval() {
    let backend = FakeBackend::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let panel = panel(backend.clone(), notifier.clone());
    panel.initialize().await;

    backend.respond_to_start(json!({"migrationId": "m1", "status": "started", "startedAt": 1000}));
    backend.set_status(
        "m1",
        json!({"migrationId": "m1", "status": "completed", "completedAt": 4000, "duration": 3000}),
    );
    panel.start_migration().await.unwrap();
    let started_at = tokio::time::Instant::now();

    tokio::time::timeout(Duration::from_secs(10), panel.wait_until_idle())
        .await
        .expect("migration should resolve on the first tick");

    assert!(started_at.elapsed() >= DEFAULT_POLL_INTERVAL);
    assert_eq!(backend.status_calls(), 1);
    let snap = panel.snapshot();
    assert_eq!(snap.records[0].status, MigrationStatus::Completed);
    assert_eq!(snap.records[0].duration_ms(), Some(3000.0));
    assert!(!snap.polling);
    assert_eq!(notifier.count(NotificationKind::Success), 2);
}

#[tokio::test(start_paused = true)]
async fn keeps_polling_every_interval_while_started() {
    let backend = FakeBackend::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let panel = panel(backend.clone(), notifier.clone());
    panel.initialize().await;

    backend.respond_to_start(json!({"migrationId": "m1", "status": "started"}));
    backend.set_status("m1", json!({"migrationId": "m1", "status": "started"}));
    panel.start_migration().await.unwrap();

    tokio::time::sleep(Duration::from_millis(9_500)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(backend.status_calls(), 3);

    panel.shutdown();
    tokio::time::sleep(Duration::from_secs(30)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(backend.status_calls(), 3);
    assert_eq!(notifier.all().len(), 1);
}
