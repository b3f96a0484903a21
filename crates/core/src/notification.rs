//! User-facing notifications raised by the panel.

use serde::Serialize;

/// Whether a notification reports good or bad news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Failure,
}

/// A single toast-style message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    /// The migration the message is about, when there is one.
    pub migration_id: Option<String>,
}

impl Notification {
    pub fn start_succeeded(migration_id: &str) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: "Migration started".into(),
            migration_id: Some(migration_id.to_string()),
        }
    }

    pub fn start_failed() -> Self {
        Self {
            kind: NotificationKind::Failure,
            message: "Failed to start migration".into(),
            migration_id: None,
        }
    }

    pub fn migration_completed(migration_id: &str) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: format!("Migration {migration_id} completed"),
            migration_id: Some(migration_id.to_string()),
        }
    }

    pub fn migration_failed(migration_id: &str) -> Self {
        Self {
            kind: NotificationKind::Failure,
            message: format!("Migration {migration_id} failed"),
            migration_id: Some(migration_id.to_string()),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Failure => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_migration() {
        assert_eq!(
            Notification::migration_completed("m1").message,
            "Migration m1 completed"
        );
        assert_eq!(Notification::migration_failed("m1").message, "Migration m1 failed");
    }

    #[test]
    fn start_failure_has_no_migration_id() {
        let n = Notification::start_failed();
        assert_eq!(n.kind, NotificationKind::Failure);
        assert!(n.migration_id.is_none());
        assert_eq!(n.to_string(), "[error] Failed to start migration");
    }
}
