//! Run summary and report printing

use indexmap::IndexMap;
use refcheck_registries::EntityEntry;
use std::collections::BTreeMap;

use crate::validate::{Finding, Severity};

/// Maximum number of example entity IDs shown per domain
const EXAMPLE_LIMIT: usize = 3;

/// Per-domain entity inventory
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DomainSummary {
    /// Total registered entities in this domain
    pub count: usize,
    /// Enabled entities
    pub enabled: usize,
    /// Disabled entities
    pub disabled: usize,
    /// Up to three example entity IDs, in first-seen order
    pub examples: Vec<String>,
}

/// Summarize the entity registry by domain
///
/// Domains come out lexicographically sorted; examples keep the snapshot's
/// own order, which is why the entity map is insertion-ordered.
pub fn entity_summary(entities: &IndexMap<String, EntityEntry>) -> BTreeMap<String, DomainSummary> {
    let mut summary: BTreeMap<String, DomainSummary> = BTreeMap::new();

    for (entity_id, entry) in entities {
        let info = summary.entry(entry.domain().to_string()).or_default();

        info.count += 1;
        if entry.is_disabled() {
            info.disabled += 1;
        } else {
            info.enabled += 1;
        }

        if info.examples.len() < EXAMPLE_LIMIT {
            info.examples.push(entity_id.clone());
        }
    }

    summary
}

/// Print the full run report: errors, warnings, inventory, verdict
pub fn print_report(findings: &[Finding], summary: &BTreeMap<String, DomainSummary>) {
    let errors: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .collect();
    let warnings: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.severity == Severity::Warning)
        .collect();

    if !errors.is_empty() {
        println!("ERRORS:");
        for finding in &errors {
            println!("  ❌ {}", finding);
        }
        println!();
    }

    if !warnings.is_empty() {
        println!("WARNINGS:");
        for finding in &warnings {
            println!("  ⚠️  {}", finding);
        }
        println!();
    }

    if !summary.is_empty() {
        println!("AVAILABLE ENTITIES BY DOMAIN:");
        for (domain, info) in summary {
            println!(
                "  {}: {} enabled, {} disabled",
                domain, info.enabled, info.disabled
            );
            if !info.examples.is_empty() {
                println!("    Examples: {}", info.examples.join(", "));
            }
        }
        println!();
    }

    if errors.is_empty() && warnings.is_empty() {
        println!("✅ All entity/device references are valid!");
    } else if errors.is_empty() {
        println!("✅ Entity/device references are valid (with warnings)");
    } else {
        println!("❌ Invalid entity/device references found");
    }
}
