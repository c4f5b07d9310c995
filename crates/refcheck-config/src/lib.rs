//! YAML document loading for reference checking
//!
//! This crate parses Home Assistant YAML configuration files into the
//! generic `serde_yaml::Value` tree while converting the custom directive
//! tags (`!include`, `!secret`, `!input`, ...) into opaque marker scalars
//! of the form `"<tag> <argument>"`.
//!
//! Directives are recognized, never resolved: no included file is read and
//! no secret is looked up. Downstream reference extraction only needs to
//! tell a directive apart from a genuine identifier string.
//!
//! # Example
//!
//! ```ignore
//! use refcheck_config::DocumentLoader;
//!
//! let doc = DocumentLoader::load_file("config/configuration.yaml")?;
//! ```

mod error;
mod loader;

pub use error::{ConfigError, ConfigResult};
pub use loader::{DocumentLoader, KNOWN_TAGS};

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;
