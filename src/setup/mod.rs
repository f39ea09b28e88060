//! Setup module for first-run configuration.
//!
//! Writes a default configuration file when none exists yet, so the
//! installation can be tuned by editing it with `depthwave config`.

use crate::config::{get_config_path, DepthwaveConfig};

/// Writes the default configuration if the config file is missing.
///
/// Returns `true` when a new file was written.
///
/// # Errors
/// Returns an error if the config directory or file cannot be written.
pub fn run_setup() -> anyhow::Result<bool> {
    let config_path = get_config_path()?;
    if config_path.exists() {
        tracing::debug!("Config present at {}", config_path.display());
        return Ok(false);
    }

    DepthwaveConfig::default().save()?;
    tracing::info!("Default configuration written to {}", config_path.display());
    Ok(true)
}
