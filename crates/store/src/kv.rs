//! Byte-level key-value storage interface.

/// Errors from a [`KeyValueStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key contains characters the backend cannot store safely.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Reading or writing the underlying medium failed.
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The in-memory store's lock was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Minimal persistent map from string keys to opaque bytes.
///
/// Mirrors what a browser's local storage offers: whole-value reads and
/// writes, no transactions, no listing.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// Allowed key characters: alphanumeric, hyphen, underscore, dot, with no
/// leading dot. Keys map directly onto file names in
/// [`FileStore`](crate::FileStore), which keeps its temp files dot-prefixed.
pub(crate) fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 128
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    if is_safe_key(key) {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
