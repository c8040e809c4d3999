//! File-based Snapshot Storage Adapter
//!
//! Stores each namespaced snapshot as `<base_path>/<key>.json`.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ports::{SnapshotStorage, StorageError};

/// File-based storage for state snapshots
#[derive(Debug, Clone)]
pub struct FileSnapshotStorage {
    base_path: PathBuf,
}

impl FileSnapshotStorage {
    /// Create a new file storage with a base directory
    ///
    /// # Example
    /// ```ignore
    /// let storage = FileSnapshotStorage::new("./data/snapshots");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Keys become file names, so only a conservative character set is allowed.
    fn file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(format!("{key}.json")))
    }

    async fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }
}

#[async_trait]
impl SnapshotStorage for FileSnapshotStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.file_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(e.to_string())),
        }
    }

    async fn write(&self, key: &str, json: &str) -> Result<(), StorageError> {
        let path = self.file_path(key)?;
        self.ensure_dir().await?;

        // Write to a sibling temp file first so readers never see a torn blob.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.file_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(e.to_string())),
        }
    }
}
