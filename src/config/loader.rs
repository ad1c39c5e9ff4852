// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LookupConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<LookupConfig> {
        let content = Self::substitute_env_vars(content)?;

        let config: LookupConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${DATA_DIR:-./data} -> ./data (if DATA_DIR not set)
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}")
            .context("Invalid substitution pattern")?;

        Ok(re
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                let default_value = caps.get(2).map(|m| m.as_str());

                match std::env::var(var_name) {
                    Ok(value) => value,
                    Err(_) => match default_value {
                        Some(default) => default.to_string(),
                        // Keep original if no default and var not found
                        None => format!("${{{}}}", var_name),
                    },
                }
            })
            .to_string())
    }

    /// Validate configuration
    pub(crate) fn validate(config: &LookupConfig) -> Result<()> {
        match config.zenoh.mode.as_str() {
            "peer" | "client" | "router" => {}
            unknown => bail!("zenoh.mode must be peer, client or router, got '{}'", unknown),
        }

        if config.dataset.data_dir.is_empty() {
            bail!("dataset.data_dir cannot be empty");
        }

        if config.dataset.index_file.is_empty() {
            bail!("dataset.index_file cannot be empty");
        }

        if config.dataset.partition_pattern.is_empty() {
            bail!("dataset.partition_pattern cannot be empty");
        }

        if config.dataset.max_connections == 0 {
            bail!("dataset.max_connections must be > 0");
        }

        if config.query.key_prefix.is_empty() || config.query.key_prefix.contains(['*', '$', '?', '#']) {
            bail!("query.key_prefix must be a non-empty literal key expression");
        }

        if config.query.max_limit == 0 || config.query.max_limit > PAGE_LIMIT_CAP {
            bail!("query.max_limit must be within 1..={}", PAGE_LIMIT_CAP);
        }

        if config.query.default_limit == 0 || config.query.default_limit > config.query.max_limit {
            bail!(
                "query.default_limit must be within 1..={}",
                config.query.max_limit
            );
        }

        match config.logging.format.as_str() {
            "text" | "json" => {}
            unknown => bail!("logging.format must be text or json, got '{}'", unknown),
        }

        Ok(())
    }
}
