//! Configuration loading functionality.
//!
//! Resolves the configuration path, reads and parses the TOML file and runs
//! validation. A missing file yields the compiled defaults.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::common::utils::private_path;

pub const CONFIG_DIR_NAME: &str = "shabbat-clock";
pub const CONFIG_FILE_NAME: &str = "shabbat-clock.toml";

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
/// This can only be called once, typically at startup.
/// Returns an error if already set.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Get the configuration file path.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration using automatic path detection.
///
/// Returns the defaults when no configuration file exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        log_debug!(
            "No configuration at {}, using defaults",
            private_path(&config_path)
        );
        return Ok(Config::default());
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load configuration from a specific path.
///
/// Unlike `load`, a missing file is an error here.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)?;

    Ok(config)
}
