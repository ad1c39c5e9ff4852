// Configuration module for record-lookup
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LookupConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<LookupConfig> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config);
    ConfigLoader::validate(&config)?;
    Ok(config)
}

/// Allow environment variables to override config values
pub fn apply_env_overrides(config: &mut LookupConfig) {
    if let Ok(data_dir) = std::env::var("RECORD_LOOKUP_DATA_DIR") {
        config.dataset.data_dir = data_dir;
    }

    if let Ok(prefix) = std::env::var("RECORD_LOOKUP_KEY_PREFIX") {
        config.query.key_prefix = prefix;
    }
}
