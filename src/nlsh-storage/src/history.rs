//! Append-only JSONL history log.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nlsh_engine::{HistoryRecord, HistoryStore};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Result, StorageError};

/// One JSON object per line, appended and synced on every save.
#[derive(Debug)]
pub struct JsonlHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub async fn append(&self, record: &HistoryRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        file.sync_all()
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;

        debug!(id = %record.id, path = %self.path.display(), "History record appended");
        Ok(())
    }

    /// The last `limit` records, oldest first. Unparseable lines are skipped.
    pub async fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let mut records: Vec<HistoryRecord> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "Skipping malformed history line");
                    None
                }
            })
            .collect();

        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
        Ok(records)
    }
}

#[async_trait]
impl HistoryStore for JsonlHistoryStore {
    async fn save(&self, record: &HistoryRecord) -> nlsh_engine::Result<()> {
        Ok(self.append(record).await?)
    }
}
