//! Configuration management for nlsh.
//!
//! Configuration lives in a single YAML file, located through `NLSH_CONFIG`,
//! then `NLSH_HOME/config.yaml`, then `~/.nlsh/config.yaml`. Every section is
//! optional and falls back to its defaults.
//!
//! ```yaml
//! default_model: gpt
//! fallback_models: [local]
//! models:
//!   - name: gpt
//!     endpoint: https://api.openai.com/v1
//!     auth_env: OPENAI_API_KEY
//!     model: gpt-4o-mini
//!     wire:
//!       json_mode: true
//!   - name: local
//!     endpoint: http://localhost:1234/v1
//!     model: qwen2.5-coder
//! safety:
//!   auto_execute_safe: false
//! ```

mod loader;
mod types;

use std::path::PathBuf;

pub use loader::{
    CONFIG_FILE, HISTORY_FILE, NLSH_CONFIG_ENV, NLSH_HOME_ENV, RULES_FILE, find_nlsh_home,
    get_config_path, load_config, parse_config_content, resolve_home_path,
};
pub use types::*;

use crate::error::Result;

/// Source of the configuration for a query.
pub trait ConfigProvider: Send + Sync {
    /// Load the configuration.
    fn load(&self) -> Result<Config>;
}

/// Reads the YAML configuration file on every load.
#[derive(Debug, Clone)]
pub struct YamlConfigProvider {
    path: PathBuf,
}

impl YamlConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Provider for the discovered config file location.
    pub fn discover() -> Result<Self> {
        Ok(Self::new(get_config_path()?))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ConfigProvider for YamlConfigProvider {
    fn load(&self) -> Result<Config> {
        load_config(&self.path)
    }
}

/// Hands out a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: Config,
}

impl StaticConfigProvider {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn load(&self) -> Result<Config> {
        Ok(self.config.clone())
    }
}
