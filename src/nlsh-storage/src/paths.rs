//! Default locations for nlsh data.
//!
//! - History: `<nlsh home>/history.jsonl` (`~/.nlsh` unless `NLSH_HOME` is set)
//! - Response cache: the platform cache directory, e.g. `~/.cache/nlsh` on
//!   Linux and `~/Library/Caches/nlsh` on macOS

use std::path::PathBuf;

use nlsh_engine::config::{Config, HISTORY_FILE, find_nlsh_home, resolve_home_path};
use tracing::debug;

use crate::error::{Result, StorageError};

/// Application name used for the cache directory.
pub const APP_NAME: &str = "nlsh";

/// Subdirectory of the nlsh home used when no platform cache dir exists.
pub const CACHE_DIR: &str = "cache";

/// Platform cache directory for nlsh.
pub fn default_cache_dir() -> Result<PathBuf> {
    if let Some(base) = dirs::cache_dir() {
        return Ok(base.join(APP_NAME));
    }
    let home = find_nlsh_home().map_err(|_| StorageError::HomeDirNotFound)?;
    Ok(home.join(CACHE_DIR))
}

/// History file for a configuration.
pub fn history_path(config: &Config) -> Result<PathBuf> {
    resolve_home_path(config.history.path.as_deref(), HISTORY_FILE)
        .ok_or(StorageError::HomeDirNotFound)
}

/// Cache directory for a configuration.
pub fn cache_dir(config: &Config) -> Result<PathBuf> {
    match &config.cache.dir {
        Some(dir) => Ok(dir.clone()),
        None => {
            let dir = default_cache_dir()?;
            debug!(path = %dir.display(), "Using default cache directory");
            Ok(dir)
        }
    }
}
