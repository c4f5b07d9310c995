//! Error types for document loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for document loading operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading a configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A tag outside the recognized vocabulary
    #[error("unknown tag '{tag}' in {path}")]
    UnknownTag { tag: String, path: PathBuf },
}
