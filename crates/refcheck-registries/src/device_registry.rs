//! Device registry snapshot

use serde::Deserialize;

/// Storage key for the device registry
pub const STORAGE_KEY: &str = "core.device_registry";

/// A registered device entry
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    /// Opaque device ID
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// Device registry snapshot data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceRegistryData {
    /// All registered devices
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}
