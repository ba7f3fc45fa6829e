//! Error types for nlsh-storage.

use std::path::PathBuf;

use nlsh_engine::EngineError;
use thiserror::Error;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error during file operations.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache keys must be lowercase hex digests.
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// Home directory not found.
    #[error("Could not determine home/cache directory")]
    HomeDirNotFound,
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io { source, .. } => EngineError::Io(source),
            StorageError::Json(e) => EngineError::Json(e),
            other => EngineError::execution(other.to_string()),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
