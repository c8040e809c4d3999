//! Snapshot storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per snapshot namespace
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Prefix shared by every snapshot key
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.directory.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("storage.directory"));
        }
        let valid = !self.namespace.is_empty()
            && self
                .namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ValidationError::InvalidNamespace);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            namespace: default_namespace(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("./data/snapshots")
}

fn default_namespace() -> String {
    "studio".to_string()
}
