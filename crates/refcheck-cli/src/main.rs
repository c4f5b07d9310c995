//! Reference validator for Home Assistant configuration
//!
//! Usage: `refcheck [config_dir]`
//!
//! Validates that entity, device, and area references in the top-level YAML
//! files resolve against the `.storage/` registries, then prints a report.
//! Exits 0 when no errors were found (warnings permitted), 1 otherwise.

use anyhow::Result;
use refcheck_core::RefChecker;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Quiet by default; RUST_LOG turns diagnostics on. Logs go to stderr
    // so the report on stdout stays clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config".to_string());
    debug!("validating references in {}", config_dir);

    let mut checker = RefChecker::new(config_dir);
    checker.validate_all();
    checker.print_report();

    if checker.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}
