//! Reference extraction from parsed configuration documents
//!
//! A single recursive walk pulls out every entity, device, area, and
//! registry-UUID reference in a document, plus entity references embedded
//! in Jinja template expressions (`states('sensor.x')` and friends).
//!
//! The skip rules are asymmetric on purpose: entity reference values are
//! filtered for tag markers, UUID shapes, template expressions, and the
//! `all`/`none` keywords, while device and area values only skip tag
//! markers. Device and area id spaces have no UUID or template ambiguity.

use regex::Regex;
use serde_yaml::Value;
use std::collections::BTreeSet;

/// Keys whose values are entity references
const ENTITY_KEYS: &[&str] = &["entity_id", "entity_ids", "entities"];

/// Keys whose values are device references
const DEVICE_KEYS: &[&str] = &["device_id", "device_ids"];

/// Keys whose values are area references
const AREA_KEYS: &[&str] = &["area_id", "area_ids"];

/// Special keywords that are not entity IDs
const SPECIAL_KEYWORDS: &[&str] = &["all", "none"];

/// Substrings that mark a string as a template with state lookups
const TEMPLATE_HELPERS: &[&str] = &["state_attr(", "states(", "is_state("];

/// Patterns for entity references inside template expressions, in match order
const TEMPLATE_PATTERNS: &[&str] = &[
    r"states\('([^']+)'\)",
    r#"states\("([^"]+)"\)"#,
    r"states\.([a-zA-Z_][a-zA-Z0-9_]*\.[a-zA-Z_][a-zA-Z0-9_]*)",
    r"is_state\('([^']+)'",
    r#"is_state\("([^"]+)""#,
    r"state_attr\('([^']+)'",
    r#"state_attr\("([^"]+)""#,
];

/// All references extracted from one document
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct References {
    /// Entity IDs (domain.object_id), including template-embedded ones
    pub entities: BTreeSet<String>,
    /// Opaque device IDs
    pub devices: BTreeSet<String>,
    /// Opaque area IDs
    pub areas: BTreeSet<String>,
    /// Entity registry UUIDs found under entity reference keys
    pub registry_ids: BTreeSet<String>,
}

/// Walks a document tree and collects references by category
pub struct ReferenceExtractor {
    /// 32 lowercase hex characters (registry UUID without hyphens)
    uuid_re: Regex,
    /// `{{ ... }}` template expression marker
    template_re: Regex,
    /// Ordered template scraping patterns, capture group 1
    template_patterns: Vec<Regex>,
}

impl ReferenceExtractor {
    pub fn new() -> Self {
        Self {
            uuid_re: Regex::new(r"^[a-f0-9]{32}$").expect("valid regex"),
            template_re: Regex::new(r"\{\{.*?\}\}").expect("valid regex"),
            template_patterns: TEMPLATE_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("valid regex"))
                .collect(),
        }
    }

    /// Extract all references from a parsed document
    pub fn extract(&self, doc: &Value) -> References {
        let mut refs = References::default();
        self.walk(doc, &mut refs);
        refs
    }

    /// Check if a string matches the registry UUID shape
    pub fn is_uuid_format(&self, value: &str) -> bool {
        self.uuid_re.is_match(value)
    }

    fn walk(&self, value: &Value, refs: &mut References) {
        match value {
            Value::Mapping(map) => {
                for (key, val) in map {
                    match key.as_str() {
                        Some(key) if ENTITY_KEYS.contains(&key) => {
                            self.collect_entity_values(val, refs)
                        }
                        Some(key) if DEVICE_KEYS.contains(&key) => {
                            let References {
                                entities, devices, ..
                            } = refs;
                            self.collect_opaque_values(val, entities, devices)
                        }
                        Some(key) if AREA_KEYS.contains(&key) => {
                            let References { entities, areas, .. } = refs;
                            self.collect_opaque_values(val, entities, areas)
                        }
                        _ => self.walk(val, refs),
                    }
                }
            }
            Value::Sequence(seq) => {
                for item in seq {
                    self.walk(item, refs);
                }
            }
            Value::String(s) => self.scan_template(s, &mut refs.entities),
            _ => {}
        }
    }

    /// Collect scalar or sequence values under an entity reference key
    fn collect_entity_values(&self, value: &Value, refs: &mut References) {
        match value {
            Value::String(s) => self.push_entity_candidate(s, refs),
            Value::Sequence(seq) => {
                for item in seq {
                    if let Value::String(s) = item {
                        self.push_entity_candidate(s, refs);
                    }
                }
            }
            _ => {}
        }
    }

    fn push_entity_candidate(&self, value: &str, refs: &mut References) {
        // Template scraping applies to every string node, even skipped ones
        self.scan_template(value, &mut refs.entities);

        if value.starts_with('!') {
            return;
        }
        if self.is_uuid_format(value) {
            refs.registry_ids.insert(value.to_string());
            return;
        }
        if self.template_re.is_match(value) {
            return;
        }
        if SPECIAL_KEYWORDS.contains(&value) {
            return;
        }
        refs.entities.insert(value.to_string());
    }

    /// Collect scalar or sequence values under a device/area key,
    /// skipping only tag markers
    fn collect_opaque_values(
        &self,
        value: &Value,
        entities: &mut BTreeSet<String>,
        out: &mut BTreeSet<String>,
    ) {
        match value {
            Value::String(s) => self.push_opaque_candidate(s, entities, out),
            Value::Sequence(seq) => {
                for item in seq {
                    if let Value::String(s) = item {
                        self.push_opaque_candidate(s, entities, out);
                    }
                }
            }
            _ => {}
        }
    }

    fn push_opaque_candidate(
        &self,
        value: &str,
        entities: &mut BTreeSet<String>,
        out: &mut BTreeSet<String>,
    ) {
        self.scan_template(value, entities);

        if !value.starts_with('!') {
            out.insert(value.to_string());
        }
    }

    /// Scrape entity IDs out of a template string
    ///
    /// Only captures with exactly one separating dot are kept; longer dotted
    /// paths are attribute accesses, not entity IDs.
    fn scan_template(&self, text: &str, out: &mut BTreeSet<String>) {
        if !TEMPLATE_HELPERS.iter().any(|h| text.contains(h)) {
            return;
        }

        for pattern in &self.template_patterns {
            for captures in pattern.captures_iter(text) {
                let candidate = &captures[1];
                if candidate.split('.').count() == 2 {
                    out.insert(candidate.to_string());
                }
            }
        }
    }
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}
