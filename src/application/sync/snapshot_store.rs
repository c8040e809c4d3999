//! Typed, namespaced access to persisted snapshots.
//!
//! Storage failures never propagate: reads fall back to defaults and writes
//! are logged and dropped. The stores built on top must keep working with
//! a broken or missing disk.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::domain::sync::PersistedState;
use crate::ports::SnapshotStorage;

pub struct SnapshotStore {
    storage: Arc<dyn SnapshotStorage>,
    prefix: String,
}

impl SnapshotStore {
    pub const DEFAULT_PREFIX: &'static str = "studio";

    pub fn new(storage: Arc<dyn SnapshotStorage>, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
        }
    }

    /// Storage key for `namespace`: `{prefix}.{namespace}`.
    pub fn key(&self, namespace: &str) -> String {
        format!("{}.{}", self.prefix, namespace)
    }

    /// Decoded snapshot, or `None` when missing, unreadable, or malformed.
    pub async fn load<T: DeserializeOwned>(&self, namespace: &str) -> Option<T> {
        let key = self.key(namespace);
        let raw = match self.storage.read(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Snapshot read failed, using defaults");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Malformed snapshot, using defaults");
                None
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, namespace: &str, default: T) -> T {
        self.load(namespace).await.unwrap_or(default)
    }

    /// Writes `value`. Returns whether it reached storage.
    pub async fn set<T: Serialize + ?Sized>(&self, namespace: &str, value: &T) -> bool {
        let key = self.key(namespace);
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Snapshot not serializable");
                return false;
            }
        };
        match self.storage.write(&key, &json).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Snapshot write failed");
                false
            }
        }
    }

    pub async fn remove(&self, namespace: &str) {
        let key = self.key(namespace);
        if let Err(e) = self.storage.remove(&key).await {
            tracing::warn!(key = %key, error = %e, "Snapshot remove failed");
        }
    }

    /// Startup state for `S`: persisted snapshot merged with defaults, or
    /// plain defaults when nothing usable is stored.
    pub async fn hydrate<S: PersistedState>(&self) -> S {
        match self.load::<S>(S::NAMESPACE).await {
            Some(persisted) => {
                tracing::debug!(namespace = S::NAMESPACE, "Hydrated from snapshot");
                S::hydrate(persisted)
            }
            None => S::default(),
        }
    }

    /// Writes the non-ephemeral part of `state`.
    pub async fn persist<S: PersistedState>(&self, state: &S) -> bool {
        self.set(S::NAMESPACE, &state.to_persisted()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::{FileSnapshotStorage, InMemorySnapshotStorage};
    use crate::domain::foundation::WindowId;
    use crate::domain::sync::{LayoutState, LayoutTab};

    fn store() -> (SnapshotStore, InMemorySnapshotStorage) {
        let storage = InMemorySnapshotStorage::new();
        (SnapshotStore::new(Arc::new(storage.clone()), "studio"), storage)
    }

    #[tokio::test]
    async fn missing_snapshot_yields_default() {
        let (store, _) = store();
        assert_eq!(store.get("zoom", 1.0f64).await, 1.0);
        assert_eq!(store.hydrate::<LayoutState>().await, LayoutState::default());
    }

    #[tokio::test]
    async fn malformed_snapshot_yields_default() {
        let (store, storage) = store();
        storage.insert_raw("studio.layout", "{ nope").await;
        assert_eq!(store.hydrate::<LayoutState>().await, LayoutState::default());
    }

    #[tokio::test]
    async fn unavailable_storage_is_swallowed() {
        let (store, storage) = store();
        storage.set_unavailable(true);

        assert!(!store.set("zoom", &2.0).await);
        assert_eq!(store.get("zoom", 1.0f64).await, 1.0);
        store.remove("zoom").await;
    }

    #[tokio::test]
    async fn persist_drops_ephemeral_fields() {
        let (store, storage) = store();
        let mut layout = LayoutState::default();
        layout.pop_out("mixer", WindowId::new()).unwrap();

        assert!(store.persist(&layout).await);
        let raw = storage.raw("studio.layout").await.unwrap();
        let stored: LayoutState = serde_json::from_str(&raw).unwrap();
        assert!(stored.popped_out_tabs.is_empty());
    }

    #[tokio::test]
    async fn hydrate_merges_with_defaults() {
        let (store, _) = store();
        let mut saved = LayoutState::default();
        saved.rename_tab("mixer", "Desk").unwrap();
        saved.close_tab("analysis").unwrap();
        saved.add_tab(LayoutTab::new("notes", "Notes", &["notes"])).unwrap();
        store.persist(&saved).await;

        let hydrated: LayoutState = store.hydrate().await;
        let ids: Vec<&str> = hydrated.tabs.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["arrangement", "mixer", "notes", "analysis"]);
        assert_eq!(hydrated.tab("mixer").unwrap().title, "Desk");
    }

    #[tokio::test]
    async fn survives_restart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SnapshotStore::new(Arc::new(FileSnapshotStorage::new(dir.path())), "studio");
            store.set("zoom", &3.5f64).await;
        }
        let reopened = SnapshotStore::new(Arc::new(FileSnapshotStorage::new(dir.path())), "studio");
        assert_eq!(reopened.get("zoom", 1.0f64).await, 3.5);

        reopened.remove("zoom").await;
        assert_eq!(reopened.get("zoom", 1.0f64).await, 1.0);
    }
}
