//! The panel controller.
//!
//! [`PanelController`] exclusively owns the in-memory migration list. It
//! runs the startup sequence (load history, reconcile leftover `started`
//! records one at a time, then enable persistence and polling), guards the
//! start action, and applies every status update through one path that
//! merges, persists, notifies, and re-syncs the polling loop.
//!
//! All state sits behind a single `std::sync::Mutex` that is never held
//! across an `.await`, so updates are applied strictly one at a time in
//! the order their responses arrive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{watch, OnceCell};

use jobwatch_client::MigrationBackend;
use jobwatch_core::migration::{apply_update, started_ids};
use jobwatch_core::panel_state::has_active;
use jobwatch_core::{MigrationRecord, MigrationUpdate, Notification, PanelState};
use jobwatch_store::MigrationHistory;

use crate::error::PanelError;
use crate::notifier::Notifier;
use crate::reconcile::{fetch_update, ReconcileLoop};
use crate::scheduler::{Scheduler, Tick};

/// Interval between status checks while any migration is running.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Point-in-time view of the panel for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSnapshot {
    /// Most recent first.
    pub records: Vec<MigrationRecord>,
    pub state: PanelState,
    pub initialized: bool,
    pub polling: bool,
}

/// Cheaply cloneable handle to one panel.
#[derive(Clone)]
pub struct PanelController {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn MigrationBackend>,
    history: MigrationHistory,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn Scheduler>,
    poll_interval: Duration,
    shared: Mutex<Shared>,
    /// Set once the startup sequence has run to completion.
    startup: OnceCell<()>,
    /// Mirrors `has_active` once initialized, for [`PanelController::wait_until_idle`].
    active_tx: watch::Sender<bool>,
}

#[derive(Default)]
struct Shared {
    records: Vec<MigrationRecord>,
    start_in_flight: bool,
    initialized: bool,
    shut_down: bool,
    reconcile: ReconcileLoop,
}

impl PanelController {
    pub fn new(
        backend: Arc<dyn MigrationBackend>,
        history: MigrationHistory,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn Scheduler>,
        poll_interval: Duration,
    ) -> Self {
        let (active_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                backend,
                history,
                notifier,
                scheduler,
                poll_interval,
                shared: Mutex::new(Shared::default()),
                startup: OnceCell::new(),
                active_tx,
            }),
        }
    }

    /// Run the startup sequence.
    ///
    /// 1. Load the persisted list and make it the in-memory list.
    /// 2. Resolve every `started` record from that snapshot, sequentially,
    ///    awaiting each status check before issuing the next.
    /// 3. Mark the panel initialized, save the reconciled list, and start
    ///    polling if anything is still running.
    ///
    /// Actions are rejected with [`PanelError::NotReady`] until this
    /// returns. The sequence runs once: overlapping calls wait for the
    /// first one to finish, and later calls return immediately.
    pub async fn initialize(&self) {
        self.inner.startup.get_or_init(|| self.run_startup()).await;
    }

    async fn run_startup(&self) {
        let leftovers = {
            let mut shared = self.inner.lock();
            if shared.initialized || shared.shut_down {
                return;
            }
            shared.records = self.inner.history.load();
            started_ids(&shared.records)
        };

        tracing::info!(
            leftover = leftovers.len(),
            "Reconciling migrations left running by a previous session",
        );

        for migration_id in &leftovers {
            self.inner.reconcile_one(migration_id).await;
        }

        let mut shared = self.inner.lock();
        if shared.shut_down {
            return;
        }
        shared.initialized = true;
        self.inner.history.save(&shared.records);
        self.inner.sync_polling(&mut shared);

        tracing::info!(
            count = shared.records.len(),
            polling = shared.reconcile.is_polling(),
            "Panel initialized",
        );
    }

    /// Ask the backend to start a new migration.
    ///
    /// Rejected without any backend call while a start is in flight or any
    /// migration is `started`. On success the new record is prepended,
    /// persisted, announced, and polling begins. On failure a failure
    /// notification is raised and the list is left untouched.
    pub async fn start_migration(&self) -> Result<MigrationRecord, PanelError> {
        {
            let mut shared = self.inner.lock();
            if shared.shut_down {
                return Err(PanelError::ShutDown);
            }
            if !shared.initialized {
                return Err(PanelError::NotReady);
            }
            if shared.start_in_flight || has_active(&shared.records) {
                tracing::debug!("Start rejected, panel is busy");
                return Err(PanelError::Busy);
            }
            shared.start_in_flight = true;
        }

        let in_flight = StartInFlight { inner: &self.inner };
        let result = match self.inner.backend.start().await {
            Ok(update) => update.into_record().map_err(PanelError::from),
            Err(e) => Err(PanelError::from(e)),
        };

        match result {
            Ok(record) => {
                {
                    // Clear the flag and insert under one lock so no second
                    // start can slip in between. The backend already runs the
                    // job, so it is recorded even after shutdown; polling
                    // stays off in that case.
                    let mut shared = self.inner.lock();
                    shared.start_in_flight = false;
                    shared.records.insert(0, record.clone());
                    self.inner.history.save(&shared.records);
                    self.inner.sync_polling(&mut shared);
                }
                tracing::info!(migration_id = %record.id, status = %record.status, "Migration started");
                self.inner
                    .notifier
                    .notify(Notification::start_succeeded(&record.id));
                Ok(record)
            }
            Err(e) => {
                drop(in_flight);
                tracing::warn!(error = %e, "Failed to start migration");
                self.inner.notifier.notify(Notification::start_failed());
                Err(e)
            }
        }
    }

    /// Re-check every currently `started` migration right now, the same way
    /// a timer tick does.
    pub async fn refresh(&self) {
        if !self.inner.lock().initialized {
            return;
        }
        self.inner.poll_active().await;
    }

    /// Resolve once no migration is `started`.
    ///
    /// Only meaningful after [`initialize`](Self::initialize); before that
    /// it resolves immediately.
    pub async fn wait_until_idle(&self) {
        let mut rx = self.inner.active_tx.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = rx.wait_for(|active| !*active).await;
    }

    /// Stop polling for good. Later responses are dropped and later actions
    /// are rejected with [`PanelError::ShutDown`].
    pub fn shutdown(&self) {
        let mut shared = self.inner.lock();
        shared.shut_down = true;
        shared.reconcile.stop();
        self.inner.active_tx.send_replace(false);
        tracing::info!("Panel shut down");
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let shared = self.inner.lock();
        PanelSnapshot {
            records: shared.records.clone(),
            state: PanelState::derive(&shared.records, shared.start_in_flight),
            initialized: shared.initialized,
            polling: shared.reconcile.is_polling(),
        }
    }

    pub fn state(&self) -> PanelState {
        let shared = self.inner.lock();
        PanelState::derive(&shared.records, shared.start_in_flight)
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One timer tick: check every `started` record concurrently.
    ///
    /// The id set is read from the live list at tick time, never from a
    /// snapshot taken when the timer was armed.
    async fn poll_active(self: &Arc<Self>) {
        let ids = {
            let mut shared = self.lock();
            if shared.shut_down {
                return;
            }
            let ids = started_ids(&shared.records);
            if ids.is_empty() {
                self.sync_polling(&mut shared);
            }
            ids
        };

        join_all(ids.iter().map(|id| self.reconcile_one(id))).await;
    }

    async fn reconcile_one(self: &Arc<Self>, migration_id: &str) {
        if let Some(update) = fetch_update(self.backend.as_ref(), migration_id).await {
            self.apply(update);
        }
    }

    /// Merge one status update and react to it.
    fn apply(self: &Arc<Self>, update: MigrationUpdate) {
        let notification = {
            let mut shared = self.lock();
            if shared.shut_down {
                return;
            }

            let transition = match apply_update(&mut shared.records, &update) {
                Ok(transition) => transition,
                Err(e) => {
                    tracing::debug!(error = %e, "Dropping status for unknown migration");
                    return;
                }
            };

            tracing::debug!(
                migration_id = %update.migration_id,
                status = ?update.status,
                ?transition,
                "Applied status update",
            );

            if shared.initialized {
                self.history.save(&shared.records);
            }
            self.sync_polling(&mut shared);
            transition.notification(&update.migration_id)
        };

        if let Some(notification) = notification {
            self.notifier.notify(notification);
        }
    }

    /// Bring the polling loop in line with the list. No-op until initialized.
    fn sync_polling(self: &Arc<Self>, shared: &mut Shared) {
        if !shared.initialized || shared.shut_down {
            return;
        }

        let active = has_active(&shared.records);
        let weak = Arc::downgrade(self);
        shared.reconcile.sync(active, || {
            self.scheduler
                .schedule(self.poll_interval, poll_tick(weak))
        });
        self.active_tx.send_if_modified(|current| {
            let changed = *current != active;
            *current = active;
            changed
        });
    }
}

/// Timer callback. Holds the panel weakly so a dropped panel stops polling.
fn poll_tick(inner: Weak<Inner>) -> Tick {
    Arc::new(move || {
        let inner = inner.clone();
        Box::pin(async move {
            if let Some(inner) = inner.upgrade() {
                inner.poll_active().await;
            }
        })
    })
}

/// Clears the start-in-flight flag even if the start future is dropped.
struct StartInFlight<'a> {
    inner: &'a Inner,
}

impl Drop for StartInFlight<'_> {
    fn drop(&mut self) {
        self.inner.lock().start_in_flight = false;
    }
}
