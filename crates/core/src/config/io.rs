//! Reading and writing `oasis.json`.

use super::{OasisConfig, validate_config};
use dirs_next::config_dir;
use oasis_util::expand_tilde;
use std::env;
use std::fs::{self, create_dir_all, write};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configuration location.
pub const CONFIG_PATH_ENV: &str = "OASIS_CONFIG_PATH";

/// Returns the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("oasis").join("oasis.json")
}

/// Loads and validates the configuration from the default path.
pub fn load_config() -> anyhow::Result<OasisConfig> {
    let path = default_config_path();
    load_config_from_path(&path)
}

/// Loads and validates the configuration from a specific path. A missing
/// file yields the default configuration.
pub fn load_config_from_path(path: &Path) -> anyhow::Result<OasisConfig> {
    if !path.exists() {
        return Ok(OasisConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config: OasisConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Saves the configuration to a specific path.
pub fn save_config_to_path(config: &OasisConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent_directory) = path.parent() {
        create_dir_all(parent_directory)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    write(path, content)?;
    Ok(())
}
