//! Snapshot persistence
//!
//! The engine treats storage as a synchronous string key-value store, the same contract a
//! browser's localStorage offers. The store never inspects the values it holds.

pub mod file;
pub mod memory;

use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error for key {key} at {}: {source}", .path.display())]
    Io {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable key-value store with synchronous get/set/delete by string key
pub trait SnapshotStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`; removing a missing key succeeds
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
