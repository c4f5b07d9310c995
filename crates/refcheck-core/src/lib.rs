//! Reference validation engine
//!
//! Cross-checks entity, device, and area references in a Home Assistant
//! YAML configuration corpus against the `.storage/` registry snapshots.
//!
//! One run drives, per file: document loading (custom tags preserved as
//! markers), reference extraction, and classification against the cached
//! registries and the YAML-defined entity set. Findings accumulate on the
//! [`RefChecker`] session and are printed at the end.
//!
//! # Example
//!
//! ```ignore
//! use refcheck_core::RefChecker;
//!
//! let mut checker = RefChecker::new("config");
//! let valid = checker.validate_all();
//! checker.print_report();
//! ```

use std::path::{Path, PathBuf};
use std::{fs, io};

pub mod extract;
pub mod report;
pub mod scanner;
pub mod validate;

pub use extract::{ReferenceExtractor, References};
pub use report::{entity_summary, print_report, DomainSummary};
pub use scanner::{normalize_name, EntityDefinitionScanner};
pub use validate::{Finding, RefChecker, Severity};

/// The secrets file is never opened, parsed, or validated
pub const SECRETS_FILE: &str = "secrets.yaml";

/// Top-level YAML files in a directory, sorted by name
///
/// Non-recursive on purpose: subdirectories hold blueprints and packages
/// that carry `!input` placeholders and are not part of the validated
/// corpus. A directory that cannot be listed is an error, distinct from
/// a directory that merely contains no YAML files.
pub fn yaml_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
        })
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_files_non_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["b.yaml", "a.yml", "c.txt"] {
            let mut file = fs::File::create(dir.path().join(name)).unwrap();
            file.write_all(b"key: value\n").unwrap();
        }
        fs::create_dir(dir.path().join("blueprints")).unwrap();
        let mut nested = fs::File::create(dir.path().join("blueprints/auto.yaml")).unwrap();
        nested.write_all(b"key: value\n").unwrap();

        let files = yaml_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.yml", "b.yaml"]);
    }

    #[test]
    fn test_yaml_files_empty_dir_is_ok() {
        let dir = TempDir::new().unwrap();
        assert!(yaml_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_yaml_files_unlistable_path_is_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not_a_dir");
        fs::write(&file, "key: value\n").unwrap();

        assert!(yaml_files(&file).is_err());
    }
}
