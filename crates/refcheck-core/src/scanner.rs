//! Discovery of YAML-defined entities
//!
//! Entities are not only created through the registry: template sensors,
//! integration-hosted sensors, and input helpers are declared directly in
//! YAML, and python_scripts can publish state under brand new entity IDs.
//! The validator treats all of those as defined, so references to them
//! downgrade from "unknown entity" to a warning.
//!
//! Five authoring styles coexist in real configurations and all of them
//! have to be reconciled here:
//! 1. `template:` as a sequence of `sensor`/`binary_sensor` blocks
//! 2. `template:` as a mapping keyed by sub-domain
//! 3. Legacy `sensor:`/`binary_sensor:` platform lists, including the
//!    legacy template platform's nested `sensors:`/`binary_sensors:` maps
//! 4. Integration blocks (`mqtt`, `rest`, `command_line`, `sql`, `scrape`)
//!    with `sensor`/`binary_sensor` subsections
//! 5. Input helper domains, where every key is an object_id
//!
//! Files that fail to parse are skipped silently during discovery. That is
//! a known leniency gap kept on purpose: discovery is best-effort, and the
//! parse failure is reported by validation of the same file anyway.

use refcheck_config::DocumentLoader;
use regex::Regex;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::{yaml_files, SECRETS_FILE};

/// Sub-domains that can hold entity definitions
const SUB_DOMAINS: &[&str] = &["sensor", "binary_sensor"];

/// Integrations that host sensor/binary_sensor subsections
const INTEGRATION_KEYS: &[&str] = &["mqtt", "rest", "command_line", "sql", "scrape"];

/// Helper domains where every key under the domain is an object_id
const INPUT_HELPER_KEYS: &[&str] = &[
    "input_number",
    "input_boolean",
    "input_text",
    "input_select",
    "input_datetime",
];

/// Patterns matching `hass.states.set('domain.object_id', ...)` calls
/// in python_scripts sources, in match order
const STATE_SET_PATTERNS: &[&str] = &[
    r#"hass\.states\.set\(['"]([a-z_]+\.[a-z0-9_]+)['"]"#,
    r#"hass\.states\.set\("([a-z_]+\.[a-z0-9_]+)""#,
];

/// Scans the configuration corpus for implicitly declared entity IDs
pub struct EntityDefinitionScanner {
    config_dir: PathBuf,
    state_set_patterns: Vec<Regex>,
}

impl EntityDefinitionScanner {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            state_set_patterns: STATE_SET_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("valid regex"))
                .collect(),
        }
    }

    /// Scan all top-level YAML files and python_scripts for entity definitions
    pub fn scan(&self) -> BTreeSet<String> {
        let mut entities = BTreeSet::new();

        // Best-effort: an unlistable directory yields no definitions here;
        // validation reports it as a run error
        for file in yaml_files(&self.config_dir).unwrap_or_default() {
            if file.file_name().map(|n| n == SECRETS_FILE).unwrap_or(false) {
                continue;
            }
            match DocumentLoader::load_file(&file) {
                Ok(doc) => collect_defined_entities(&doc, &mut entities),
                Err(e) => {
                    // Best-effort: discovery never reports parse failures
                    debug!("skipping unparsable file during discovery: {}", e);
                }
            }
        }

        self.scan_python_scripts(&mut entities);

        debug!("discovered {} YAML-defined entities", entities.len());
        entities
    }

    /// Scan python_scripts sources for state registrations
    fn scan_python_scripts(&self, out: &mut BTreeSet<String>) {
        let scripts_dir = self.config_dir.join("python_scripts");
        if !scripts_dir.is_dir() {
            return;
        }

        let Ok(entries) = fs::read_dir(&scripts_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|ext| ext == "py").unwrap_or(false) {
                let Ok(content) = fs::read_to_string(&path) else {
                    continue;
                };
                for pattern in &self.state_set_patterns {
                    for captures in pattern.captures_iter(&content) {
                        out.insert(captures[1].to_string());
                    }
                }
            }
        }
    }
}

/// Normalize a `name:` field into an object_id
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .replace('-', "_")
        .replace('"', "")
}

/// Dispatch top-level keys to the matching authoring-style rule
fn collect_defined_entities(doc: &Value, out: &mut BTreeSet<String>) {
    let Some(map) = doc.as_mapping() else {
        return;
    };

    for (key, value) in map {
        let Some(key) = key.as_str() else { continue };

        match key {
            "template" => match value {
                Value::Sequence(items) => {
                    for item in items {
                        collect_template_block(item, out);
                    }
                }
                Value::Mapping(_) => collect_template_block(value, out),
                _ => {}
            },
            "sensor" | "binary_sensor" => collect_platform_domain(key, value, out),
            k if INTEGRATION_KEYS.contains(&k) => collect_integration_block(value, out),
            k if INPUT_HELPER_KEYS.contains(&k) => collect_input_helpers(k, value, out),
            _ => {}
        }
    }
}

/// Modern `template:` block: sub-domain keys holding name-bearing definitions
fn collect_template_block(node: &Value, out: &mut BTreeSet<String>) {
    let Some(map) = node.as_mapping() else {
        return;
    };

    for (sub_domain, definitions) in map {
        let Some(sub_domain) = sub_domain.as_str() else {
            continue;
        };
        if !SUB_DOMAINS.contains(&sub_domain) {
            continue;
        }
        let Some(definitions) = definitions.as_sequence() else {
            continue;
        };
        for definition in definitions {
            if let Some(name) = definition.get("name").and_then(Value::as_str) {
                out.insert(format!("{}.{}", sub_domain, normalize_name(name)));
            }
        }
    }
}

/// Legacy `sensor:`/`binary_sensor:` platform blocks
fn collect_platform_domain(domain: &str, value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Sequence(items) => {
            for item in items {
                if let Some(name) = item.get("name").and_then(Value::as_str) {
                    out.insert(format!("{}.{}", domain, normalize_name(name)));
                }
                collect_nested_definitions(item, domain, out);
            }
        }
        Value::Mapping(_) => collect_nested_definitions(value, domain, out),
        _ => {}
    }
}

/// Nested definitions inside a platform block
///
/// Handles the legacy template platform's `sensors:`/`binary_sensors:`
/// mappings (each key is an object_id), direct definitions recognizable by
/// `friendly_name`/`value_template`/`state`, and nested sub-domain blocks.
fn collect_nested_definitions(config: &Value, domain: &str, out: &mut BTreeSet<String>) {
    let Some(map) = config.as_mapping() else {
        return;
    };

    for (key, value) in map {
        let Some(key) = key.as_str() else { continue };
        let Some(inner) = value.as_mapping() else {
            continue;
        };

        if key == "sensors" || key == "binary_sensors" {
            let entity_domain = if key == "binary_sensors" {
                "binary_sensor"
            } else {
                domain
            };
            for (object_id, entity_config) in inner {
                if !entity_config.is_mapping() {
                    continue;
                }
                if let Some(object_id) = object_id.as_str() {
                    out.insert(format!("{}.{}", entity_domain, object_id));
                }
            }
        } else if inner.get("friendly_name").is_some()
            || inner.get("value_template").is_some()
            || inner.get("state").is_some()
        {
            // This mapping is itself an entity definition; its key is the object_id
            out.insert(format!("{}.{}", domain, key));
        } else if SUB_DOMAINS.contains(&key) {
            collect_nested_definitions(value, key, out);
        }
    }
}

/// Integration-hosted sensors (`mqtt:`, `rest:`, ...)
fn collect_integration_block(value: &Value, out: &mut BTreeSet<String>) {
    let Some(map) = value.as_mapping() else {
        return;
    };

    for (sub_domain, definitions) in map {
        let Some(sub_domain) = sub_domain.as_str() else {
            continue;
        };
        if !SUB_DOMAINS.contains(&sub_domain) {
            continue;
        }
        let Some(definitions) = definitions.as_sequence() else {
            continue;
        };
        for definition in definitions {
            if let Some(name) = definition.get("name").and_then(Value::as_str) {
                out.insert(format!("{}.{}", sub_domain, normalize_name(name)));
            }
        }
    }
}

/// Input helpers: every key under the domain mapping is an object_id
fn collect_input_helpers(domain: &str, value: &Value, out: &mut BTreeSet<String>) {
    let Some(map) = value.as_mapping() else {
        return;
    };

    for (object_id, _) in map {
        if let Some(object_id) = object_id.as_str() {
            out.insert(format!("{}.{}", domain, object_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn collect(yaml: &str) -> BTreeSet<String> {
        let doc = DocumentLoader::parse_str(yaml, Path::new("test.yaml")).unwrap();
        let mut out = BTreeSet::new();
        collect_defined_entities(&doc, &mut out);
        out
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Kitchen Light"), "kitchen_light");
        assert_eq!(normalize_name("Out-Door \"Temp\""), "out_door_temp");
    }

    #[test]
    fn test_modern_template_list_style() {
        let entities = collect(
            "template:\n  - sensor:\n      - name: Kitchen Light\n        state: \"{{ 1 }}\"\n  - binary_sensor:\n      - name: Door Open\n        state: \"{{ true }}\"\n",
        );
        assert!(entities.contains("sensor.kitchen_light"));
        assert!(entities.contains("binary_sensor.door_open"));
    }

    #[test]
    fn test_modern_template_dict_style() {
        let entities = collect(
            "template:\n  sensor:\n    - name: Hourly Usage\n      state: \"{{ 1 }}\"\n",
        );
        assert!(entities.contains("sensor.hourly_usage"));
    }

    #[test]
    fn test_legacy_platform_direct_name() {
        let entities = collect(
            "sensor:\n  - platform: rest\n    name: Outdoor Temp\n    resource: http://example\n",
        );
        assert!(entities.contains("sensor.outdoor_temp"));
    }

    #[test]
    fn test_legacy_template_platform_sensors_map() {
        let entities = collect(
            "sensor:\n  - platform: template\n    sensors:\n      water_usage:\n        friendly_name: Water Usage\n        value_template: \"{{ 1 }}\"\n",
        );
        assert!(entities.contains("sensor.water_usage"));
    }

    #[test]
    fn test_legacy_binary_sensors_map_forces_domain() {
        let entities = collect(
            "sensor:\n  - platform: template\n    binary_sensors:\n      door_open:\n        value_template: \"{{ true }}\"\n",
        );
        assert!(entities.contains("binary_sensor.door_open"));
    }

    #[test]
    fn test_integration_hosted_sensors() {
        let entities = collect(
            "mqtt:\n  sensor:\n    - name: Power Meter\n      state_topic: tele/meter\n  binary_sensor:\n    - name: Motion Hall\n      state_topic: tele/motion\n",
        );
        assert!(entities.contains("sensor.power_meter"));
        assert!(entities.contains("binary_sensor.motion_hall"));
    }

    #[test]
    fn test_input_helper_keys_are_object_ids() {
        let entities = collect(
            "input_number:\n  last_water_usage:\n    min: 0\n    max: 1000\ninput_boolean:\n  guest_mode: {}\n",
        );
        assert!(entities.contains("input_number.last_water_usage"));
        assert!(entities.contains("input_boolean.guest_mode"));
    }

    #[test]
    fn test_unrelated_keys_ignored() {
        let entities = collect(
            "automation:\n  - alias: Something\nlight:\n  - platform: group\n    name: All Lights\n",
        );
        assert!(entities.is_empty());
    }

    #[test]
    fn test_scan_python_scripts() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "python_scripts/hourly_water_usage.py",
            "hass.states.set('sensor.hourly_water_usage', hourly_usage, {\n    'unit_of_measurement': 'm3'\n})\n",
        );
        write_file(
            dir.path(),
            "python_scripts/other.py",
            "hass.states.set(\"sensor.daily_total\", total)\n",
        );

        let entities = EntityDefinitionScanner::new(dir.path()).scan();
        assert!(entities.contains("sensor.hourly_water_usage"));
        assert!(entities.contains("sensor.daily_total"));
    }

    #[test]
    fn test_scan_unions_all_files() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "configuration.yaml",
            "input_boolean:\n  away_mode: {}\n",
        );
        write_file(
            dir.path(),
            "sensors.yaml",
            "template:\n  sensor:\n    - name: Combined\n      state: \"{{ 1 }}\"\n",
        );

        let entities = EntityDefinitionScanner::new(dir.path()).scan();
        assert!(entities.contains("input_boolean.away_mode"));
        assert!(entities.contains("sensor.combined"));
    }

    #[test]
    fn test_unparsable_file_skipped_silently() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "broken.yaml", "key: [unclosed\n");
        write_file(
            dir.path(),
            "good.yaml",
            "input_text:\n  note: {}\n",
        );

        let entities = EntityDefinitionScanner::new(dir.path()).scan();
        assert!(entities.contains("input_text.note"));
    }

    #[test]
    fn test_secrets_file_not_scanned() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "secrets.yaml",
            "input_boolean:\n  should_not_appear: {}\n",
        );

        let entities = EntityDefinitionScanner::new(dir.path()).scan();
        assert!(entities.is_empty());
    }
}
