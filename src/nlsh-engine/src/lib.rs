//! nlsh Engine - turns a natural-language request into a vetted shell command.
//!
//! This crate contains the query pipeline:
//! - Configuration loading (YAML, `NLSH_HOME`, `NLSH_CONFIG`)
//! - Environment context collection (cwd, shell, tools, git, kubernetes, docker)
//! - OpenAI-compatible model clients, streaming and JSON mode
//! - A first-success-wins race across the configured candidate models
//! - Guardrail evaluation and the execution decision
//!
//! Terminal I/O, process spawning and persistence are collaborators behind
//! traits; see `nlsh-exec`, `nlsh-storage` and the `nlsh` binary.

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

#[cfg(test)]
mod tests;

pub mod approval;
pub mod cache;
pub mod candidates;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod history;
pub mod orchestrator;
pub mod query;
pub mod race;

pub use approval::{Clipboard, ConfirmationPrompter};
pub use cache::{ResponseCache, cache_key};
pub use candidates::resolve_candidates;
pub use client::{
    ChatCompletionsProvider, GenerateOptions, Generation, HttpProviderFactory, Provider,
    ProviderFactory,
};
pub use config::{
    Config, ConfigProvider, ModelDefinition, StaticConfigProvider, YamlConfigProvider,
};
pub use context::{ContextCollector, ContextSnapshot, EnvironmentCollector, GitStatus};
pub use error::{EngineError, QueryFailure, Result};
pub use executor::{CommandExecutor, ExecutionResult};
pub use history::{HistoryRecord, HistoryStore};
pub use orchestrator::{QueryOrchestrator, QueryOrchestratorBuilder};
pub use query::{ExecutionDecision, QueryRequest, QueryResponse};
pub use race::{RaceWinner, race};

pub use nlsh_guardrail;
