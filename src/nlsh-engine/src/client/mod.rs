//! Model providers.
//!
//! A [`ProviderFactory`] turns a [`ModelDefinition`] into a [`Provider`];
//! the provider turns a prompt plus context into a [`Generation`]. The HTTP
//! implementation speaks the OpenAI-compatible chat completions protocol.

mod chat;
mod parse;
pub mod prompt;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chat::{ChatCompletionsProvider, HttpProviderFactory};
pub use parse::parse_generation;

use crate::config::ModelDefinition;
use crate::context::ContextSnapshot;
use crate::error::Result;

/// Output of one successful generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// Command text to evaluate.
    pub command: String,
    /// Full model reply.
    pub reply: String,
    /// Explanation given by the model.
    pub reasoning: String,
}

/// Per-call generation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Use a streamed response.
    pub streaming: bool,
}

/// Generates a command for a prompt.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        context: &ContextSnapshot,
        model: &ModelDefinition,
        options: GenerateOptions,
    ) -> Result<Generation>;
}

/// Builds providers for model definitions.
pub trait ProviderFactory: Send + Sync {
    fn for_model(&self, model: &ModelDefinition) -> Result<Arc<dyn Provider>>;
}
