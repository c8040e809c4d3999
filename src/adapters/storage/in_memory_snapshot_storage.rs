//! In-Memory Snapshot Storage Adapter
//!
//! Stores snapshots in memory. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{SnapshotStorage, StorageError};

/// In-memory storage for state snapshots
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStorage {
    blobs: Arc<RwLock<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySnapshotStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a blob directly, bypassing the port.
    pub async fn insert_raw(&self, key: impl Into<String>, json: impl Into<String>) {
        self.blobs.write().await.insert(key.into(), json.into());
    }

    /// Raw blob currently stored under `key`.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.blobs.read().await.get(key).cloned()
    }

    /// While unavailable, every operation fails.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Get the number of stored snapshots
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("in-memory storage disabled".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SnapshotStorage for InMemorySnapshotStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, json: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.blobs
            .write()
            .await
            .insert(key.to_string(), json.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_removes() {
        let storage = InMemorySnapshotStorage::new();
        storage.write("a", "1").await.unwrap();
        assert_eq!(storage.read("a").await.unwrap().as_deref(), Some("1"));

        storage.remove("a").await.unwrap();
        assert_eq!(storage.read("a").await.unwrap(), None);
        assert_eq!(storage.len().await, 0);
    }

    #[tokio::test]
    async fn unavailable_storage_errors() {
        let storage = InMemorySnapshotStorage::new();
        storage.set_unavailable(true);
        assert!(matches!(
            storage.read("a").await,
            Err(StorageError::Unavailable(_))
        ));
        assert!(storage.write("a", "1").await.is_err());
    }

    #[tokio::test]
    async fn clones_share_blobs() {
        let storage = InMemorySnapshotStorage::new();
        let clone = storage.clone();
        storage.insert_raw("k", "v").await;
        assert_eq!(clone.raw("k").await.as_deref(), Some("v"));
    }
}
