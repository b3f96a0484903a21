//! The Idle/Polling reconciliation loop.
//!
//! [`ReconcileLoop`] holds the loop's state: either no timer (Idle) or the
//! [`TimerHandle`] of the one repeating timer (Polling). The controller calls
//! [`ReconcileLoop::sync`] after every change to the record list, so the
//! timer exists exactly while some record is `started`.
//!
//! [`fetch_update`] is the per-job status check every tick runs. Failures
//! are deliberately quiet: the next tick simply tries again.

use jobwatch_client::MigrationBackend;
use jobwatch_core::MigrationUpdate;

use crate::scheduler::TimerHandle;

/// Aggregate polling state over the record list.
#[derive(Debug, Default)]
pub enum LoopState {
    /// No record is `started`; no timer runs.
    #[default]
    Idle,
    /// At least one record is `started`; the timer below is running.
    Polling(TimerHandle),
}

#[derive(Debug, Default)]
pub struct ReconcileLoop {
    state: LoopState,
}

impl ReconcileLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.state, LoopState::Polling(_))
    }

    /// Move to Polling when `has_active` and Idle otherwise.
    ///
    /// `start_timer` is only called on an Idle -> Polling transition.
    /// Returns `true` if the state changed.
    pub fn sync(&mut self, has_active: bool, start_timer: impl FnOnce() -> TimerHandle) -> bool {
        match (&self.state, has_active) {
            (LoopState::Idle, true) => {
                self.state = LoopState::Polling(start_timer());
                tracing::debug!("Polling started");
                true
            }
            (LoopState::Polling(_), false) => {
                self.stop();
                tracing::debug!("Polling stopped, no active migrations");
                true
            }
            _ => false,
        }
    }

    /// Tear the timer down unconditionally.
    pub fn stop(&mut self) {
        if let LoopState::Polling(handle) = std::mem::take(&mut self.state) {
            handle.cancel();
        }
    }
}

/// Ask the backend for one migration's current status.
///
/// Returns `None` on any failure; a failed check leaves the record as it
/// is and is retried on the next tick. The update is keyed by the id that
/// was asked for, whatever id the body echoes back.
pub async fn fetch_update(
    backend: &dyn MigrationBackend,
    migration_id: &str,
) -> Option<MigrationUpdate> {
    match backend.fetch_status(migration_id).await {
        Ok(mut update) => {
            update.migration_id = migration_id.to_string();
            Some(update)
        }
        Err(e) => {
            tracing::debug!(migration_id, error = %e, "Status check failed, retrying next tick");
            None
        }
    }
}
