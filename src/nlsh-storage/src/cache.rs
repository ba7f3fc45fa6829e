//! File-backed response cache.
//!
//! Each entry is `<dir>/<key>.json` holding the generation and its creation
//! time. Entries older than the TTL are treated as misses and removed. When
//! the number of entries exceeds the bound, the least recently written ones
//! are evicted.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nlsh_engine::config::CacheConfig;
use nlsh_engine::{Generation, ResponseCache};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::error::{Result, StorageError};

const ENTRY_EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    created_at: DateTime<Utc>,
    generation: Generation,
}

/// Response cache stored as one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileResponseCache {
    dir: PathBuf,
    ttl: Duration,
    max_entries: usize,
}

impl FileResponseCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            max_entries,
        }
    }

    pub fn from_config(dir: impl Into<PathBuf>, config: &CacheConfig) -> Self {
        Self::new(dir, Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{ENTRY_EXTENSION}")))
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(entry.created_at).to_std() {
            Ok(age) => age < self.ttl,
            // Written "in the future": the clock went backwards.
            Err(_) => true,
        }
    }

    /// Fresh generation for `key`, removing stale or corrupt entries.
    pub async fn lookup(&self, key: &str) -> Result<Option<Generation>> {
        let path = self.entry_path(key)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Removing corrupt cache entry");
                remove_quietly(&path).await;
                return Ok(None);
            }
        };

        if !self.is_fresh(&entry, Utc::now()) {
            trace!(key, "Cache entry expired");
            remove_quietly(&path).await;
            return Ok(None);
        }
        Ok(Some(entry.generation))
    }

    /// Store a generation, then enforce the entry bound.
    pub async fn store(&self, key: &str, generation: &Generation) -> Result<()> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?;

        let entry = CacheEntry {
            created_at: Utc::now(),
            generation: generation.clone(),
        };
        let content = serde_json::to_vec(&entry)?;

        // Write to a temp file and rename so readers never see a partial entry.
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        file.write_all(&content)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        file.sync_all()
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        drop(file);
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::io(&path, e))?;

        debug!(key, "Cached response");
        self.evict().await
    }

    /// Remove the oldest entries beyond `max_entries`.
    pub async fn evict(&self) -> Result<()> {
        let mut entries = self.entries().await?;
        if entries.len() <= self.max_entries {
            return Ok(());
        }

        entries.sort_by_key(|(_, modified)| *modified);
        let excess = entries.len() - self.max_entries;
        for (path, _) in entries.into_iter().take(excess) {
            trace!(path = %path.display(), "Evicting cache entry");
            remove_quietly(&path).await;
        }
        debug!(evicted = excess, "Cache trimmed");
        Ok(())
    }

    /// Number of entries on disk.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.entries().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Remove every entry.
    pub async fn clear(&self) -> Result<()> {
        for (path, _) in self.entries().await? {
            remove_quietly(&path).await;
        }
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(PathBuf, SystemTime)>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != ENTRY_EXTENSION) {
                continue;
            }
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((path, modified));
        }
        Ok(entries)
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "Failed to remove cache entry");
    }
}

#[async_trait]
impl ResponseCache for FileResponseCache {
    async fn get(&self, key: &str) -> nlsh_engine::Result<Option<Generation>> {
        Ok(self.lookup(key).await?)
    }

    async fn put(&self, key: &str, generation: &Generation) -> nlsh_engine::Result<()> {
        Ok(self.store(key, generation).await?)
    }
}
