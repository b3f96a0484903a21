//! Shared fakes for panel integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use jobwatch_client::{MigrationApiError, MigrationBackend};
use jobwatch_core::{MigrationRecord, MigrationUpdate, Notification, NotificationKind};
use jobwatch_panel::{PanelController, Scheduler, Tick, TimerHandle};
use jobwatch_store::{KeyValueStore, MemoryStore, MigrationHistory, MIGRATIONS_KEY};

// ---------------------------------------------------------------------------
// FakeBackend
// ---------------------------------------------------------------------------

/// Scripted migration backend.
///
/// Start and status answers are set by the test; every call is recorded.
#[derive(Default)]
pub struct FakeBackend {
    start_response: Mutex<Option<Result<Value, u16>>>,
    statuses: Mutex<HashMap<String, Result<Value, u16>>>,
    start_calls: AtomicUsize,
    status_log: Mutex<Vec<String>>,
    hold_start: AtomicBool,
    release_start: Notify,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond_to_start(&self, body: Value) {
        *self.start_response.lock().unwrap() = Some(Ok(body));
    }

    pub fn fail_start(&self, status: u16) {
        *self.start_response.lock().unwrap() = Some(Err(status));
    }

    /// Make `start` wait until [`release_start`](Self::release_start).
    pub fn hold_start(&self) {
        self.hold_start.store(true, Ordering::SeqCst);
    }

    pub fn release_start(&self) {
        self.release_start.notify_one();
    }

    pub fn set_status(&self, id: &str, body: Value) {
        self.statuses
            .lock()
            .unwrap()
            .insert(id.to_string(), Ok(body));
    }

    pub fn fail_status(&self, id: &str, status: u16) {
        self.statuses
            .lock()
            .unwrap()
            .insert(id.to_string(), Err(status));
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// `begin:<id>` / `end:<id>` entries in call order.
    pub fn status_log(&self) -> Vec<String> {
        self.status_log.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_log()
            .iter()
            .filter(|e| e.starts_with("begin:"))
            .count()
    }

    fn api_error(status: u16) -> MigrationApiError {
        MigrationApiError::ApiError {
            status,
            body: "scripted failure".into(),
        }
    }
}

#[async_trait]
impl MigrationBackend for FakeBackend {
    async fn start(&self) -> Result<MigrationUpdate, MigrationApiError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_start.load(Ordering::SeqCst) {
            self.release_start.notified().await;
        }

        let response = self.start_response.lock().unwrap().clone();
        match response {
            Some(Ok(body)) => Ok(serde_json::from_value(body).expect("scripted start body")),
            Some(Err(status)) => Err(Self::api_error(status)),
            None => Err(Self::api_error(503)),
        }
    }

    async fn fetch_status(&self, migration_id: &str) -> Result<MigrationUpdate, MigrationApiError> {
        self.status_log
            .lock()
            .unwrap()
            .push(format!("begin:{migration_id}"));
        // Give concurrently issued checks a chance to interleave.
        tokio::task::yield_now().await;

        let response = self.statuses.lock().unwrap().get(migration_id).cloned();
        self.status_log
            .lock()
            .unwrap()
            .push(format!("end:{migration_id}"));

        match response {
            Some(Ok(body)) => Ok(serde_json::from_value(body).expect("scripted status body")),
            Some(Err(status)) => Err(Self::api_error(status)),
            None => Err(Self::api_error(404)),
        }
    }
}

// ---------------------------------------------------------------------------
// ManualScheduler
// ---------------------------------------------------------------------------

struct ManualTimer {
    interval: Duration,
    tick: Tick,
    cancel: CancellationToken,
}

/// Scheduler whose ticks only happen when the test calls [`fire`](Self::fire).
#[derive(Default)]
pub struct ManualScheduler {
    timers: Mutex<Vec<ManualTimer>>,
}

impl ManualScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Timers scheduled and not yet cancelled.
    pub fn active_timers(&self) -> usize {
        self.timers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !t.cancel.is_cancelled())
            .count()
    }

    /// Timers ever scheduled.
    pub fn scheduled_total(&self) -> usize {
        self.timers.lock().unwrap().len()
    }

    pub fn last_interval(&self) -> Option<Duration> {
        self.timers.lock().unwrap().last().map(|t| t.interval)
    }

    /// Run one tick of every live timer to completion.
    pub async fn fire(&self) {
        let ticks: Vec<Tick> = self
            .timers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !t.cancel.is_cancelled())
            .map(|t| Arc::clone(&t.tick))
            .collect();

        for tick in ticks {
            tick().await;
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, interval: Duration, tick: Tick) -> TimerHandle {
        let cancel = CancellationToken::new();
        self.timers.lock().unwrap().push(ManualTimer {
            interval,
            tick,
            cancel: cancel.clone(),
        });
        TimerHandle::new(cancel)
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.all().iter().filter(|n| n.kind == kind).count()
    }
}

impl jobwatch_panel::Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub panel: PanelController,
    pub backend: Arc<FakeBackend>,
    pub scheduler: Arc<ManualScheduler>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    /// Panel over an empty store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Panel over a store pre-seeded with `records`.
    pub fn with_persisted(records: &[MigrationRecord]) -> Self {
        let store = Arc::new(MemoryStore::new());
        store
            .set(MIGRATIONS_KEY, &serde_json::to_vec(records).unwrap())
            .unwrap();
        Self::with_store(store)
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let backend = FakeBackend::new();
        let scheduler = ManualScheduler::new();
        let notifier = Arc::new(RecordingNotifier::default());

        let panel = PanelController::new(
            backend.clone(),
            MigrationHistory::new(store.clone()),
            notifier.clone(),
            scheduler.clone(),
            Duration::from_secs(3),
        );

        Self {
            panel,
            backend,
            scheduler,
            notifier,
            store,
        }
    }

    /// What is currently persisted, decoded as raw JSON.
    pub fn persisted(&self) -> Value {
        let bytes = self
            .store
            .get(MIGRATIONS_KEY)
            .unwrap()
            .expect("history should be persisted");
        serde_json::from_slice(&bytes).unwrap()
    }
}
