//! Area registry snapshot

use serde::Deserialize;

/// Storage key for the area registry
pub const STORAGE_KEY: &str = "core.area_registry";

/// A registered area entry
#[derive(Debug, Clone, Deserialize)]
pub struct AreaEntry {
    /// Opaque area ID
    pub id: String,
    /// Area name (e.g., "Living Room")
    #[serde(default)]
    pub name: String,
}

/// Area registry snapshot data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AreaRegistryData {
    /// All registered areas
    #[serde(default)]
    pub areas: Vec<AreaEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_area() {
        let json = r#"{"id": "kitchen", "name": "Kitchen", "icon": "mdi:fridge"}"#;
        let area: AreaEntry = serde_json::from_str(json).unwrap();
        assert_eq!(area.id, "kitchen");
        assert_eq!(area.name, "Kitchen");
    }
}
