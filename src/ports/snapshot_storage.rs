//! Snapshot Storage Port - namespaced key to raw JSON blob.
//!
//! Typed access, defaults and merge rules live in the application layer
//! (`SnapshotStore`); adapters only move strings.

use async_trait::async_trait;

/// Errors that can occur during snapshot storage operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Port for persisting state snapshots between sessions
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Reads the blob stored under `key`, or `None` when nothing is stored.
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the blob stored under `key`.
    async fn write(&self, key: &str, json: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
