//! Snapshot loading from the `.storage/` directory
//!
//! Home Assistant persists its registries as versioned JSON files under
//! `<config_dir>/.storage/`. A validation run reads those files once and
//! never writes them back.

use serde::{de::DeserializeOwned, Deserialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Snapshot loading errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Storage file wrapper with version tracking
///
/// JSON format:
/// ```json
/// {
///   "version": 1,
///   "minor_version": 1,
///   "key": "core.entity_registry",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct StorageFile<T> {
    /// Major version - breaking changes
    #[serde(default)]
    pub version: u32,
    /// Minor version - migrations within major version
    #[serde(default)]
    pub minor_version: u32,
    /// Storage key (file identifier)
    #[serde(default)]
    pub key: String,
    /// The actual data
    pub data: T,
}

/// Read-only access to the `.storage/` directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Path to the `.storage/` directory
    storage_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a snapshot store for a config directory
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: config_dir.as_ref().join(".storage"),
        }
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Get the file path for a storage key
    pub fn file_path(&self, key: &str) -> PathBuf {
        self.storage_dir.join(key)
    }

    /// Check if a storage key exists
    pub fn exists(&self, key: &str) -> bool {
        self.file_path(key).exists()
    }

    /// Load a snapshot from storage
    ///
    /// Returns None if the file doesn't exist.
    pub fn load<T>(&self, key: &str) -> SnapshotResult<Option<StorageFile<T>>>
    where
        T: DeserializeOwned,
    {
        let path = self.file_path(key);

        if !path.exists() {
            debug!("storage file not found: {}", key);
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let storage_file: StorageFile<T> = serde_json::from_str(&content)?;

        debug!(
            "loaded storage file: {} (v{}.{})",
            key, storage_file.version, storage_file.minor_version
        );

        Ok(Some(storage_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn write_storage(dir: &Path, key: &str, content: &str) {
        let storage = dir.join(".storage");
        fs::create_dir_all(&storage).unwrap();
        fs::write(storage.join(key), content).unwrap();
    }

    #[test]
    fn test_snapshot_load() {
        let temp_dir = TempDir::new().unwrap();
        write_storage(
            temp_dir.path(),
            "test.data",
            r#"{"version":1,"minor_version":2,"key":"test.data","data":{"name":"test","value":42}}"#,
        );

        let store = SnapshotStore::new(temp_dir.path());
        let loaded: StorageFile<TestData> = store.load("test.data").unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.minor_version, 2);
        assert_eq!(
            loaded.data,
            TestData {
                name: "test".to_string(),
                value: 42
            }
        );
    }

    #[test]
    fn test_snapshot_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path());

        let result: Option<StorageFile<TestData>> = store.load("nonexistent").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_snapshot_malformed_json() {
        let temp_dir = TempDir::new().unwrap();
        write_storage(temp_dir.path(), "test.data", "not json at all");

        let store = SnapshotStore::new(temp_dir.path());
        let result: SnapshotResult<Option<StorageFile<TestData>>> = store.load("test.data");
        assert!(matches!(result, Err(SnapshotError::Json(_))));
    }
}
