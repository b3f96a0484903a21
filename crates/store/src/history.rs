//! Best-effort persistence of the migration list.
//!
//! [`MigrationHistory`] mirrors the panel's in-memory list into a
//! [`KeyValueStore`] as one JSON array under [`MIGRATIONS_KEY`]. Neither
//! direction ever fails the caller: write errors are logged and dropped,
//! unreadable or corrupt data loads as an empty list, and a single
//! unreadable entry is skipped without losing the rest.

use std::sync::Arc;

use jobwatch_core::MigrationRecord;

use crate::kv::KeyValueStore;

/// Storage key holding the serialized record list.
pub const MIGRATIONS_KEY: &str = "migrations";

/// Snapshot reader/writer for the record list. Owns no copy of the list.
#[derive(Clone)]
pub struct MigrationHistory {
    store: Arc<dyn KeyValueStore>,
}

impl MigrationHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Serialize `records` and write them under the fixed key.
    pub fn save(&self, records: &[MigrationRecord]) {
        let bytes = match serde_json::to_vec(records) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize migration history");
                return;
            }
        };

        if let Err(e) = self.store.set(MIGRATIONS_KEY, &bytes) {
            tracing::warn!(error = %e, count = records.len(), "Failed to save migration history");
        }
    }

    /// Read the stored list, or an empty one if nothing usable is stored.
    pub fn load(&self) -> Vec<MigrationRecord> {
        let bytes = match self.store.get(MIGRATIONS_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read migration history");
                return Vec::new();
            }
        };

        let entries = match serde_json::from_slice::<Vec<serde_json::Value>>(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Stored migration history is corrupt, starting empty");
                return Vec::new();
            }
        };

        let stored = entries.len();
        let records: Vec<MigrationRecord> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping unreadable stored migration");
                    None
                }
            })
            .collect();

        tracing::debug!(count = records.len(), stored, "Loaded migration history");
        records
    }
}
