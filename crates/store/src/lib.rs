//! Local persistence for the migration panel.
//!
//! - [`KeyValueStore`] -- the byte-level get/set interface the panel
//!   depends on, with [`MemoryStore`] and [`FileStore`] implementations.
//! - [`MigrationHistory`] -- best-effort JSON snapshots of the record list
//!   under a fixed key.

pub mod file;
pub mod history;
pub mod kv;
pub mod memory;

pub use file::FileStore;
pub use history::{MigrationHistory, MIGRATIONS_KEY};
pub use kv::{KeyValueStore, StoreError};
pub use memory::MemoryStore;
