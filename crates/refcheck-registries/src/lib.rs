//! Registry snapshots for reference checking
//!
//! This crate reads the persisted identity registries from the `.storage/`
//! directory:
//! - Entities (`core.entity_registry`)
//! - Devices (`core.device_registry`)
//! - Areas (`core.area_registry`)
//!
//! The snapshots are read once per run and treated as immutable. Only the
//! fields needed to answer "does this reference resolve, and is the target
//! enabled?" are deserialized.

pub mod snapshot;

pub mod area_registry;
pub mod device_registry;
pub mod entity_registry;

// Re-export main types
pub use snapshot::{SnapshotError, SnapshotResult, SnapshotStore, StorageFile};

pub use entity_registry::{DisabledBy, EntityEntry, EntityRegistryData};

pub use device_registry::{DeviceEntry, DeviceRegistryData};

pub use area_registry::{AreaEntry, AreaRegistryData};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_entity_registry_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let storage = temp_dir.path().join(".storage");
        fs::create_dir_all(&storage).unwrap();
        fs::write(
            storage.join(entity_registry::STORAGE_KEY),
            r#"{
                "version": 1,
                "minor_version": 19,
                "key": "core.entity_registry",
                "data": {
                    "entities": [
                        {"id": "aaa", "entity_id": "sensor.temp_1", "platform": "mqtt", "disabled_by": null},
                        {"id": "bbb", "entity_id": "light.hall", "platform": "hue", "disabled_by": "user"}
                    ],
                    "deleted_entities": []
                }
            }"#,
        )
        .unwrap();

        let store = SnapshotStore::new(temp_dir.path());
        let file: StorageFile<EntityRegistryData> =
            store.load(entity_registry::STORAGE_KEY).unwrap().unwrap();

        assert_eq!(file.data.entities.len(), 2);
        assert_eq!(file.data.entities[0].entity_id, "sensor.temp_1");
        assert!(file.data.entities[1].is_disabled());
    }
}
