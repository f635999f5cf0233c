//! Tracing subscriber setup

use crate::config::LoggingConfig;
use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level; `verbose` forces
/// `debug` for this crate. Output goes to stderr so stdout stays clean for
/// rendered dashboards.
pub fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let default_directive = if verbose {
        "citycast=debug".to_string()
    } else {
        logging.level.clone()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_directive))
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", default_directive, e))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
