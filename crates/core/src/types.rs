use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-reported point in time.
///
/// The backend is not consistent about the encoding, so any shape is
/// accepted. The raw value is kept and written back unchanged; it is only
/// interpreted on demand by [`to_datetime`](Self::to_datetime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// A string, usually RFC 3339.
    Text(String),
    /// Any other JSON value, kept verbatim.
    Other(serde_json::Value),
}

impl Timestamp {
    /// Interpret the value as a UTC date-time, if possible.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
            Timestamp::Text(raw) => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Timestamp::Other(_) => None,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(dt) = self.to_datetime() {
            return write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        match self {
            Timestamp::Text(raw) => f.write_str(raw),
            // Out-of-range epoch values.
            Timestamp::EpochMillis(ms) => write!(f, "{ms}"),
            Timestamp::Other(value) => write!(f, "{value}"),
        }
    }
}
