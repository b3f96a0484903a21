//! Delivery of user-facing notifications.
//!
//! The panel hands every [`Notification`] to a [`Notifier`]. The stock
//! implementation, [`NotificationBus`], logs it and fans it out over a
//! `tokio::sync::broadcast` channel to whatever front-end is attached.

use jobwatch_core::{Notification, NotificationKind};
use tokio::sync::broadcast;

/// Sink for notifications raised by the panel.
///
/// Called synchronously from the panel's update path, so implementations
/// must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// In-process fan-out of notifications.
///
/// When the buffer is full, the oldest un-consumed notifications are
/// dropped and slow receivers observe a `RecvError::Lagged`.
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier for NotificationBus {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => tracing::info!(
                migration_id = notification.migration_id.as_deref(),
                message = %notification.message,
                "Notification",
            ),
            NotificationKind::Failure => tracing::warn!(
                migration_id = notification.migration_id.as_deref(),
                message = %notification.message,
                "Notification",
            ),
        }
        // Ignore the SendError; it only means nobody is listening.
        let _ = self.sender.send(notification);
    }
}
