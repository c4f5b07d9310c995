//! Cross-checking extracted references against the registries
//!
//! `RefChecker` is the long-lived session object for one validation run.
//! Registry maps and the YAML-defined entity set are loaded lazily on first
//! use and cached for the whole run; there is no invalidation because one
//! run is one process lifetime.
//!
//! Classification rules:
//! - unknown entity, unknown registry UUID, unknown device: Error, the
//!   owning file becomes invalid
//! - disabled entity, YAML-defined entity, UUID mapping to a disabled
//!   entity, unknown area: Warning, validity unaffected
//!
//! A registry that fails to load degrades to an empty map after one
//! finding, so every later reference of that kind classifies as unknown.
//! That cascade is intentional simplicity, not a bug.

use indexmap::IndexMap;
use refcheck_config::DocumentLoader;
use refcheck_registries::{
    area_registry, device_registry, entity_registry, AreaEntry, AreaRegistryData, DeviceEntry,
    DeviceRegistryData, EntityEntry, EntityRegistryData, SnapshotStore,
};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::extract::ReferenceExtractor;
use crate::report::{self, DomainSummary};
use crate::scanner::EntityDefinitionScanner;
use crate::{yaml_files, SECRETS_FILE};

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One validation finding
///
/// Findings are accumulated across the run and never deduplicated: the same
/// message can legitimately occur once per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// Source file, if the finding is attributable to one
    pub file: Option<PathBuf>,
    pub message: String,
}

impl Finding {
    fn error(file: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            file: file.map(Path::to_path_buf),
            message: message.into(),
        }
    }

    fn warning(file: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            file: file.map(Path::to_path_buf),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(path) => write!(f, "{}: {}", path.display(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Validates entity, device, and area references in a config directory
pub struct RefChecker {
    config_dir: PathBuf,
    store: SnapshotStore,
    extractor: ReferenceExtractor,

    /// Run-accumulated findings
    findings: Vec<Finding>,

    // Run-scoped caches, populated lazily
    entities: Option<IndexMap<String, EntityEntry>>,
    registry_id_index: Option<HashMap<String, String>>,
    devices: Option<HashMap<String, DeviceEntry>>,
    areas: Option<HashMap<String, AreaEntry>>,
    yaml_entities: Option<BTreeSet<String>>,
}

impl RefChecker {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let store = SnapshotStore::new(&config_dir);

        Self {
            config_dir,
            store,
            extractor: ReferenceExtractor::new(),
            findings: Vec::new(),
            entities: None,
            registry_id_index: None,
            devices: None,
            areas: None,
            yaml_entities: None,
        }
    }

    /// All findings accumulated so far
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Check whether any Error has been recorded across the run
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }

    fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    /// Validate every top-level YAML file in the config directory
    ///
    /// Returns false when at least one file was invalid. A missing config
    /// directory aborts immediately; everything else is per-file isolated.
    pub fn validate_all(&mut self) -> bool {
        if !self.config_dir.is_dir() {
            self.findings.push(Finding::error(
                None,
                format!(
                    "config directory {} does not exist",
                    self.config_dir.display()
                ),
            ));
            return false;
        }

        let files = match yaml_files(&self.config_dir) {
            Ok(files) => files,
            Err(e) => {
                self.findings.push(Finding::error(
                    None,
                    format!(
                        "failed to read config directory {}: {e}",
                        self.config_dir.display()
                    ),
                ));
                return false;
            }
        };
        if files.is_empty() {
            self.findings.push(Finding::warning(
                None,
                "no YAML files found in config directory",
            ));
            return true;
        }

        info!("validating {} YAML files", files.len());

        let mut all_valid = true;
        for file in files {
            if !self.validate_file(&file) {
                all_valid = false;
            }
        }

        all_valid
    }

    /// Validate all references in a single file
    ///
    /// Returns false iff at least one Error was appended while processing
    /// this file; Warnings never affect validity.
    pub fn validate_file(&mut self, path: &Path) -> bool {
        if path.file_name().map(|n| n == SECRETS_FILE).unwrap_or(false) {
            debug!("skipping secrets file");
            return true;
        }

        let errors_before = self.error_count();

        let doc = match DocumentLoader::load_file(path) {
            Ok(doc) => doc,
            Err(e) => {
                self.findings
                    .push(Finding::error(Some(path), format!("failed to load YAML: {e}")));
                return false;
            }
        };

        // An empty document is valid
        if doc.is_null() {
            return true;
        }

        let refs = self.extractor.extract(&doc);

        self.ensure_entities();
        self.ensure_registry_id_index();
        self.ensure_devices();
        self.ensure_areas();
        self.ensure_yaml_entities();

        let empty_entities = IndexMap::new();
        let empty_index = HashMap::new();
        let empty_devices = HashMap::new();
        let empty_areas = HashMap::new();
        let empty_yaml = BTreeSet::new();

        let entities = self.entities.as_ref().unwrap_or(&empty_entities);
        let registry_id_index = self.registry_id_index.as_ref().unwrap_or(&empty_index);
        let devices = self.devices.as_ref().unwrap_or(&empty_devices);
        let areas = self.areas.as_ref().unwrap_or(&empty_areas);
        let yaml_entities = self.yaml_entities.as_ref().unwrap_or(&empty_yaml);

        // Entity references (domain.object_id form)
        for entity_id in &refs.entities {
            match entities.get(entity_id) {
                Some(entry) if entry.is_disabled() => self.findings.push(Finding::warning(
                    Some(path),
                    format!("references disabled entity '{entity_id}'"),
                )),
                Some(_) => {}
                None if yaml_entities.contains(entity_id) => {
                    self.findings.push(Finding::warning(
                        Some(path),
                        format!(
                            "references YAML-defined entity '{entity_id}' (not in entity registry)"
                        ),
                    ))
                }
                None => self.findings.push(Finding::error(
                    Some(path),
                    format!("unknown entity '{entity_id}'"),
                )),
            }
        }

        // Entity registry UUID references
        for registry_id in &refs.registry_ids {
            match registry_id_index.get(registry_id) {
                None => self.findings.push(Finding::error(
                    Some(path),
                    format!("unknown entity registry ID '{registry_id}'"),
                )),
                Some(entity_id) => {
                    if entities.get(entity_id).is_some_and(EntityEntry::is_disabled) {
                        self.findings.push(Finding::warning(
                            Some(path),
                            format!(
                                "entity registry ID '{registry_id}' references disabled entity '{entity_id}'"
                            ),
                        ));
                    }
                }
            }
        }

        // Device references
        for device_id in &refs.devices {
            if !devices.contains_key(device_id) {
                self.findings.push(Finding::error(
                    Some(path),
                    format!("unknown device '{device_id}'"),
                ));
            }
        }

        // Area references: unknown areas never invalidate a file
        for area_id in &refs.areas {
            if !areas.contains_key(area_id) {
                self.findings.push(Finding::warning(
                    Some(path),
                    format!("unknown area '{area_id}'"),
                ));
            }
        }

        self.error_count() == errors_before
    }

    /// Per-domain inventory of the entity registry
    pub fn entity_summary(&mut self) -> std::collections::BTreeMap<String, DomainSummary> {
        self.ensure_entities();
        let empty = IndexMap::new();
        report::entity_summary(self.entities.as_ref().unwrap_or(&empty))
    }

    /// Print the full report to stdout
    pub fn print_report(&mut self) {
        let summary = self.entity_summary();
        report::print_report(&self.findings, &summary);
    }

    fn ensure_entities(&mut self) {
        if self.entities.is_some() {
            return;
        }

        let mut map = IndexMap::new();
        match self.store.load::<EntityRegistryData>(entity_registry::STORAGE_KEY) {
            Ok(Some(file)) => {
                info!(
                    "loaded {} entities from registry (v{}.{})",
                    file.data.entities.len(),
                    file.version,
                    file.minor_version
                );
                for entry in file.data.entities {
                    map.insert(entry.entity_id.clone(), entry);
                }
            }
            Ok(None) => self.findings.push(Finding::error(
                None,
                format!(
                    "entity registry not found: {}",
                    self.store.file_path(entity_registry::STORAGE_KEY).display()
                ),
            )),
            Err(e) => self.findings.push(Finding::error(
                None,
                format!("failed to load entity registry: {e}"),
            )),
        }
        self.entities = Some(map);
    }

    fn ensure_registry_id_index(&mut self) {
        if self.registry_id_index.is_some() {
            return;
        }
        self.ensure_entities();

        let index: HashMap<String, String> = self
            .entities
            .as_ref()
            .map(|entities| {
                entities
                    .values()
                    .map(|entry| (entry.id.clone(), entry.entity_id.clone()))
                    .collect()
            })
            .unwrap_or_default();

        self.registry_id_index = Some(index);
    }

    fn ensure_devices(&mut self) {
        if self.devices.is_some() {
            return;
        }

        let mut map = HashMap::new();
        match self.store.load::<DeviceRegistryData>(device_registry::STORAGE_KEY) {
            Ok(Some(file)) => {
                info!("loaded {} devices from registry", file.data.devices.len());
                for entry in file.data.devices {
                    map.insert(entry.id.clone(), entry);
                }
            }
            Ok(None) => self.findings.push(Finding::error(
                None,
                format!(
                    "device registry not found: {}",
                    self.store.file_path(device_registry::STORAGE_KEY).display()
                ),
            )),
            Err(e) => self.findings.push(Finding::error(
                None,
                format!("failed to load device registry: {e}"),
            )),
        }
        self.devices = Some(map);
    }

    fn ensure_areas(&mut self) {
        if self.areas.is_some() {
            return;
        }

        let mut map = HashMap::new();
        match self.store.load::<AreaRegistryData>(area_registry::STORAGE_KEY) {
            Ok(Some(file)) => {
                info!("loaded {} areas from registry", file.data.areas.len());
                for entry in file.data.areas {
                    map.insert(entry.id.clone(), entry);
                }
            }
            // An absent area registry only warns; area checks degrade to
            // "unknown area" warnings for the rest of the run
            Ok(None) => self.findings.push(Finding::warning(
                None,
                format!(
                    "area registry not found: {}",
                    self.store.file_path(area_registry::STORAGE_KEY).display()
                ),
            )),
            Err(e) => self.findings.push(Finding::warning(
                None,
                format!("failed to load area registry: {e}"),
            )),
        }
        self.areas = Some(map);
    }

    fn ensure_yaml_entities(&mut self) {
        if self.yaml_entities.is_some() {
            return;
        }

        let entities = EntityDefinitionScanner::new(&self.config_dir).scan();
        self.yaml_entities = Some(entities);
    }
}
