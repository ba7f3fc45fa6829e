//! Error types for the guardrail.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for guardrail operations.
pub type Result<T> = std::result::Result<T, GuardrailError>;

/// Errors raised while loading or compiling a rule set.
///
/// Evaluation itself never fails; every error surfaces at construction time.
#[derive(Debug, Error)]
pub enum GuardrailError {
    /// A danger pattern is not a valid regular expression.
    #[error("invalid danger pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The rules document could not be read.
    #[error("failed to read rules file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rules document is not valid YAML for the expected shape.
    #[error("failed to parse rules document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Unknown risk level name.
    #[error("unknown risk level: {0}")]
    UnknownLevel(String),

    /// Unknown guardrail action name.
    #[error("unknown guardrail action: {0}")]
    UnknownAction(String),
}
