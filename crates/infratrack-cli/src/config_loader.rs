//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use infratrack_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no --config is given
pub const DEFAULT_CONFIG_FILE: &str = "infratrack.toml";

/// Defaults, then the config file, then the environment, then CLI flags
pub fn load_config(explicit: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_file(explicit) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}

fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.is_file().then_some(local)
        }
    }
}
