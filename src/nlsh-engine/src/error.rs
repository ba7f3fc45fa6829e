//! Error types for the nlsh engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::query::QueryResponse;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read configuration file {path}: {message}")]
    ConfigRead { path: PathBuf, message: String },

    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    #[error("No providers available")]
    NoProviders,

    #[error("Invalid guardrail rules: {0}")]
    Guardrail(#[from] nlsh_guardrail::GuardrailError),

    // Provider errors
    #[error("Provider error ({model}): {message}")]
    Provider { model: String, message: String },

    #[error("All candidate models failed: {}", format_failures(.0))]
    AllCandidatesFailed(Vec<(String, String)>),

    // Policy errors
    #[error("Command blocked by guardrail: {command}")]
    Blocked { command: String, reasons: Vec<String> },

    // Execution errors
    #[error("Command failed ({}): {command}", describe_exit(.exit_code))]
    ExecutionFailed {
        command: String,
        exit_code: Option<i32>,
    },

    #[error("Execution error: {0}")]
    Execution(String),

    // Scope errors
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    // IO and serialization
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

fn format_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(model, reason)| format!("{model}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl EngineError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a provider error tagged with the model name.
    pub fn provider(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Check if this error is raised before any side effect because of bad setup.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::ConfigRead { .. }
                | Self::MissingCollaborator(_)
                | Self::ModelNotFound { .. }
                | Self::NoProviders
                | Self::Guardrail(_)
                | Self::Yaml(_)
        )
    }

    /// Check if running the same request again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::Provider { .. } | Self::AllCandidatesFailed(_)
        )
    }

    /// Check if this error comes from the guardrail refusing the command.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// A failed query together with everything gathered before the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct QueryFailure {
    #[source]
    pub error: EngineError,
    /// Partially populated response.
    pub response: Box<QueryResponse>,
}

impl QueryFailure {
    pub fn new(error: EngineError, response: QueryResponse) -> Self {
        Self {
            error,
            response: Box::new(response),
        }
    }
}
