//! Entity registry snapshot
//!
//! The entity registry is the authoritative list of registered entities.
//! Reference checking only needs the identifying fields and the disabled
//! state; everything else in the snapshot is ignored on deserialization.

use serde::Deserialize;

/// Storage key for the entity registry
pub const STORAGE_KEY: &str = "core.entity_registry";

/// Reason an entity was disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledBy {
    /// Disabled by a config entry
    ConfigEntry,
    /// Disabled by device
    Device,
    /// Disabled by Home Assistant itself
    Hass,
    /// Disabled by the integration
    Integration,
    /// Disabled by the user
    User,
}

/// A registered entity entry
#[derive(Debug, Clone, Deserialize)]
pub struct EntityEntry {
    /// Internal registry UUID
    pub id: String,
    /// Full entity ID (domain.object_id)
    pub entity_id: String,
    /// Component/platform that provides this entity
    #[serde(default)]
    pub platform: String,
    /// Disable reason (None = enabled)
    #[serde(default)]
    pub disabled_by: Option<DisabledBy>,
}

impl EntityEntry {
    /// Get the domain from entity_id
    pub fn domain(&self) -> &str {
        self.entity_id.split('.').next().unwrap_or(&self.entity_id)
    }

    /// Check if entity is disabled
    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }
}

/// Entity registry snapshot data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityRegistryData {
    /// All registered entities
    #[serde(default)]
    pub entities: Vec<EntityEntry>,
}
