//! YAML document loading with custom tag handling
//!
//! Home Assistant configuration files use custom YAML tags:
//! - `!include path` - Include another YAML file
//! - `!include_dir_list dir` - Include all YAML files in a directory as a list
//! - `!include_dir_merge_list dir` - Merge lists from all YAML files in a directory
//! - `!include_dir_named dir` - Include all YAML files as a mapping keyed by filename
//! - `!include_dir_merge_named dir` - Merge mappings from all YAML files
//! - `!input name` - Blueprint input substitution
//! - `!secret key` - Substitute from secrets.yaml
//!
//! Reference checking never needs the content behind a directive, only the
//! knowledge that a value *is* a directive rather than an identifier. Each
//! tagged node is therefore replaced with the marker scalar `"<tag> <arg>"`
//! instead of being resolved, keeping the loader free of side effects.

use crate::error::{ConfigError, ConfigResult};
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// The custom tags recognized in Home Assistant configuration files.
pub const KNOWN_TAGS: &[&str] = &[
    "!include",
    "!include_dir_named",
    "!include_dir_merge_named",
    "!include_dir_merge_list",
    "!include_dir_list",
    "!input",
    "!secret",
];

/// YAML loader that preserves custom tags as opaque marker scalars
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a YAML file, converting custom tags into marker scalars
    pub fn load_file(path: impl AsRef<Path>) -> ConfigResult<Value> {
        let path = path.as_ref();
        debug!("loading YAML file: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse_str(&content, path)
    }

    /// Parse YAML from a string, converting custom tags into marker scalars
    pub fn parse_str(content: &str, source_path: &Path) -> ConfigResult<Value> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        mark_tags(value, source_path)
    }
}

/// Recursively replace tagged nodes with `"<tag> <arg>"` marker strings
fn mark_tags(value: Value, source_path: &Path) -> ConfigResult<Value> {
    match value {
        Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            trace!("marking tag '{}' with value {:?}", tag, tagged.value);

            if !KNOWN_TAGS.contains(&tag.as_str()) {
                return Err(ConfigError::UnknownTag {
                    tag,
                    path: source_path.to_path_buf(),
                });
            }

            Ok(Value::String(format!(
                "{} {}",
                tag,
                scalar_to_string(&tagged.value)
            )))
        }
        Value::Mapping(map) => {
            let mut result = serde_yaml::Mapping::new();
            for (k, v) in map {
                let key = mark_tags(k, source_path)?;
                let value = mark_tags(v, source_path)?;
                result.insert(key, value);
            }
            Ok(Value::Mapping(result))
        }
        Value::Sequence(seq) => {
            let result: ConfigResult<Vec<Value>> = seq
                .into_iter()
                .map(|v| mark_tags(v, source_path))
                .collect();
            Ok(Value::Sequence(result?))
        }
        _ => Ok(value),
    }
}

/// Render a tag argument as a plain string
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}
