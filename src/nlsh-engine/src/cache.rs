//! Response cache interface and key derivation.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::client::Generation;
use crate::client::types::ChatMessage;
use crate::config::ModelDefinition;
use crate::error::Result;

/// Stores provider output by content hash.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Fresh entry for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Generation>>;

    async fn put(&self, key: &str, generation: &Generation) -> Result<()>;
}

/// SHA-256 over the model identity and the rendered prompt messages.
pub fn cache_key(model: &ModelDefinition, messages: &[ChatMessage]) -> String {
    let mut hasher = Sha256::new();
    for part in [model.name.as_str(), model.endpoint.as_str(), model.model.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    for message in messages {
        hasher.update(message.role.as_bytes());
        hasher.update([0u8]);
        hasher.update(message.content.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}
