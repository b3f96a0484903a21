//! Directory-backed [`KeyValueStore`].
//!
//! Each key is one file inside the state directory. Writes land in a
//! sibling temp file first and are renamed into place, so a crash mid-write
//! leaves either the old value or the new one, never a torn file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::kv::{validate_key, KeyValueStore, StoreError};

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the state directory. It is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        let tmp = self.dir.join(format!(".{key}.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;

        tracing::trace!(key, bytes = value.len(), path = %path.display(), "Stored value");
        Ok(())
    }
}
