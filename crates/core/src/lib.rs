//! Domain model for the migration status panel.
//!
//! Pure types and functions only: the job record, its open status enum,
//! the shallow merge applied when the backend reports a status, the
//! transition rules that decide which notifications fire, and the
//! derived "is busy" state used to gate the start action.

pub mod error;
pub mod migration;
pub mod notification;
pub mod panel_state;
pub mod types;

pub use error::CoreError;
pub use migration::{MigrationRecord, MigrationStatus, MigrationUpdate, Transition};
pub use notification::{Notification, NotificationKind};
pub use panel_state::PanelState;
pub use types::Timestamp;
