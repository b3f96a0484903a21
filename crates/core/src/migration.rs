//! Migration job records and the status-update merge.
//!
//! A [`MigrationRecord`] is created from the backend's start response and
//! afterwards only ever changed by [`apply_update`], which shallow-merges a
//! [`MigrationUpdate`] over every record with the same id and reports the
//! resulting [`Transition`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::notification::Notification;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Wire value for a migration the backend is still running.
pub const STATUS_STARTED: &str = "started";

/// Wire value for a migration that finished successfully.
pub const STATUS_COMPLETED: &str = "completed";

/// Wire value for a migration that finished with an error.
pub const STATUS_FAILED: &str = "failed";

/// Lifecycle state of a migration as reported by the backend.
///
/// The backend treats status as an open string, so unknown values are
/// carried in [`MigrationStatus::Other`] instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MigrationStatus {
    Started,
    Completed,
    Failed,
    Other(String),
}

impl MigrationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MigrationStatus::Started => STATUS_STARTED,
            MigrationStatus::Completed => STATUS_COMPLETED,
            MigrationStatus::Failed => STATUS_FAILED,
            MigrationStatus::Other(s) => s,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, MigrationStatus::Started)
    }
}

impl From<String> for MigrationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            STATUS_STARTED => MigrationStatus::Started,
            STATUS_COMPLETED => MigrationStatus::Completed,
            STATUS_FAILED => MigrationStatus::Failed,
            _ => MigrationStatus::Other(s),
        }
    }
}

impl From<&str> for MigrationStatus {
    fn from(s: &str) -> Self {
        MigrationStatus::from(s.to_string())
    }
}

impl From<MigrationStatus> for String {
    fn from(status: MigrationStatus) -> Self {
        match status {
            MigrationStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One migration run as cached by the panel.
///
/// Fields the backend reports beyond the known ones are kept in `extra`
/// so they survive persistence and later merges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub id: String,
    pub status: MigrationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Elapsed run time in milliseconds, computed by the backend. Any JSON
    /// number is accepted and kept as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<serde_json::Number>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MigrationRecord {
    /// Create a bare record with only an id and a status.
    pub fn new(id: impl Into<String>, status: MigrationStatus) -> Self {
        Self {
            id: id.into(),
            status,
            started_at: None,
            completed_at: None,
            duration: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Run time in milliseconds, if the backend reported one.
    pub fn duration_ms(&self) -> Option<f64> {
        self.duration.as_ref().and_then(serde_json::Number::as_f64)
    }

    /// Overwrite every field the update carries, leaving the rest as-is.
    fn merge(&mut self, update: &MigrationUpdate) {
        if let Some(status) = &update.status {
            self.status = status.clone();
        }
        if let Some(started_at) = &update.started_at {
            self.started_at = Some(started_at.clone());
        }
        if let Some(completed_at) = &update.completed_at {
            self.completed_at = Some(completed_at.clone());
        }
        if let Some(duration) = &update.duration {
            self.duration = Some(duration.clone());
        }
        for (key, value) in &update.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Backend payload
// ---------------------------------------------------------------------------

/// Body returned by both the start and the status endpoints.
///
/// ```json
/// { "migrationId": "m1", "status": "completed", "completedAt": 4000, "duration": 3000 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationUpdate {
    #[serde(default)]
    pub migration_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MigrationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<serde_json::Number>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MigrationUpdate {
    /// An update carrying only a new status.
    pub fn status(migration_id: impl Into<String>, status: MigrationStatus) -> Self {
        Self {
            migration_id: migration_id.into(),
            status: Some(status),
            started_at: None,
            completed_at: None,
            duration: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Turn a start response into a fresh record.
    ///
    /// A start response without a status is taken as `started`, since the
    /// backend only answers successfully once it has accepted the job.
    pub fn into_record(self) -> Result<MigrationRecord, CoreError> {
        if self.migration_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "start response carried an empty migrationId".into(),
            ));
        }

        Ok(MigrationRecord {
            id: self.migration_id,
            status: self.status.unwrap_or(MigrationStatus::Started),
            started_at: self.started_at,
            completed_at: self.completed_at,
            duration: self.duration,
            extra: self.extra,
        })
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// What a status update did to a record's lifecycle, as far as the
/// operator needs to hear about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `started` -> `completed`.
    Completed,
    /// `started` -> `failed`.
    Failed,
    /// Anything else, including repeated `started` observations.
    Unchanged,
}

impl Transition {
    pub fn between(prior: &MigrationStatus, next: &MigrationStatus) -> Self {
        match (prior, next) {
            (MigrationStatus::Started, MigrationStatus::Completed) => Transition::Completed,
            (MigrationStatus::Started, MigrationStatus::Failed) => Transition::Failed,
            _ => Transition::Unchanged,
        }
    }

    /// The notification this transition should raise, if any.
    pub fn notification(&self, migration_id: &str) -> Option<Notification> {
        match self {
            Transition::Completed => Some(Notification::migration_completed(migration_id)),
            Transition::Failed => Some(Notification::migration_failed(migration_id)),
            Transition::Unchanged => None,
        }
    }
}

/// Merge `update` into every record whose id matches.
///
/// The transition is judged against the first matching record's status
/// before the merge. Ids are not deduplicated, so a repeated id updates
/// all of its records. Returns [`CoreError::NotFound`] when no record
/// matches; a status update never creates a record.
pub fn apply_update(
    records: &mut [MigrationRecord],
    update: &MigrationUpdate,
) -> Result<Transition, CoreError> {
    let prior = records
        .iter()
        .find(|r| r.id == update.migration_id)
        .map(|r| r.status.clone())
        .ok_or_else(|| CoreError::NotFound(update.migration_id.clone()))?;

    for record in records.iter_mut().filter(|r| r.id == update.migration_id) {
        record.merge(update);
    }

    let next = update.status.as_ref().unwrap_or(&prior);
    Ok(Transition::between(&prior, next))
}

/// Ids of every record currently in the `started` state, in list order.
pub fn started_ids(records: &[MigrationRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.status.is_started())
        .map(|r| r.id.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
