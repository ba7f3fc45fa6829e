//! Configuration file discovery and parsing.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::Config;
use crate::error::{EngineError, Result};

/// Configuration file name inside the nlsh home directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// Guardrail rules file name inside the nlsh home directory.
pub const RULES_FILE: &str = "guardrails.yaml";

/// History file name inside the nlsh home directory.
pub const HISTORY_FILE: &str = "history.jsonl";

/// Environment variable for a custom config file path.
pub const NLSH_CONFIG_ENV: &str = "NLSH_CONFIG";

/// Environment variable for a custom home directory.
pub const NLSH_HOME_ENV: &str = "NLSH_HOME";

/// Find the nlsh home directory.
///
/// Checks in order:
/// 1. `NLSH_HOME` environment variable
/// 2. Default `~/.nlsh` directory
pub fn find_nlsh_home() -> std::io::Result<PathBuf> {
    if let Ok(val) = std::env::var(NLSH_HOME_ENV)
        && !val.is_empty()
    {
        let path = PathBuf::from(&val);
        debug!(path = %path.display(), "Using NLSH_HOME");
        return Ok(path);
    }

    dirs::home_dir()
        .map(|home| home.join(".nlsh"))
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "Home directory not found"))
}

/// Path of the configuration file.
///
/// `NLSH_CONFIG` wins over `<nlsh home>/config.yaml`.
pub fn get_config_path() -> std::io::Result<PathBuf> {
    if let Ok(val) = std::env::var(NLSH_CONFIG_ENV)
        && !val.is_empty()
    {
        let path = PathBuf::from(&val);
        debug!(path = %path.display(), "Using NLSH_CONFIG");
        return Ok(path);
    }
    Ok(find_nlsh_home()?.join(CONFIG_FILE))
}

/// Parse configuration content. Empty content yields the defaults.
pub fn parse_config_content(content: &str) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Load a configuration file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| EngineError::ConfigRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let config = parse_config_content(&content).map_err(|e| match e {
        EngineError::Yaml(err) => {
            EngineError::config(format!("invalid config file {}: {err}", path.display()))
        }
        other => other,
    })?;

    debug!(
        path = %path.display(),
        models = config.models.len(),
        default_model = %config.default_model,
        "Loaded config"
    );
    Ok(config)
}

/// Resolve a path setting against the nlsh home directory.
pub fn resolve_home_path(configured: Option<&Path>, file_name: &str) -> Option<PathBuf> {
    match configured {
        Some(path) => Some(path.to_path_buf()),
        None => find_nlsh_home().ok().map(|home| home.join(file_name)),
    }
}
