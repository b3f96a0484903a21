//! The migration panel: status polling, local history, notifications.
//!
//! - [`PanelController`] -- owns the record list, runs the startup
//!   reconciliation, and exposes the start/refresh actions.
//! - [`reconcile`] -- the Idle/Polling loop that re-checks started jobs.
//! - [`Scheduler`] -- the repeating-timer abstraction the loop runs on.
//! - [`Notifier`] -- where user-facing notifications go.

pub mod controller;
pub mod error;
pub mod notifier;
pub mod reconcile;
pub mod scheduler;

pub use controller::{PanelController, PanelSnapshot, DEFAULT_POLL_INTERVAL};
pub use error::PanelError;
pub use notifier::{NotificationBus, Notifier};
pub use scheduler::{Scheduler, Tick, TimerHandle, TokioScheduler};
