use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// SHA-256 of the configuration text, hex encoded
///
/// Logged at startup and written into run summaries so record files can be
/// traced back to the configuration that produced them.
pub fn config_digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Hashes the configuration file at `path`
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(config_digest(&std::fs::read_to_string(path)?))
}

/// Loads a configuration together with the digest of the exact text parsed
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, config_digest(&content)))
}
