//! Derived UI state used to gate the start action.

use crate::migration::MigrationRecord;

/// Flags the front-end uses to enable or disable the start action.
///
/// Purely derived from the record list plus the in-flight flag; never
/// fed back into the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelState {
    /// Any record is still `started`.
    pub has_active: bool,
    /// A start call is in flight or `has_active` holds.
    pub is_busy: bool,
}

impl PanelState {
    pub fn derive(records: &[MigrationRecord], start_in_flight: bool) -> Self {
        let has_active = has_active(records);
        Self {
            has_active,
            is_busy: start_in_flight || has_active,
        }
    }
}

pub fn has_active(records: &[MigrationRecord]) -> bool {
    records.iter().any(|r| r.status.is_started())
}
