//! Request and response values for one query.

use std::path::PathBuf;
use std::time::Duration;

use nlsh_guardrail::RiskAssessment;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::context::ContextSnapshot;
use crate::executor::ExecutionResult;

/// One user request.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Natural-language request.
    pub prompt: String,
    /// Model to use instead of the configured default.
    pub model_override: Option<String>,
    /// Never execute, whatever the guardrail says.
    pub preview_only: bool,
    /// Execute commands assessed as `allow` without asking.
    pub auto_execute: bool,
    /// Ask providers for a streamed response.
    pub streaming: bool,
    /// Consult and fill the response cache.
    pub use_cache: bool,
    /// Copy the command to the clipboard collaborator.
    pub copy_to_clipboard: bool,
    /// Overall deadline for generation and execution.
    pub timeout: Option<Duration>,
    /// Directory the command is meant for. Defaults to the process cwd.
    pub working_dir: Option<PathBuf>,
    /// Cancelling this token aborts the query.
    pub cancel: CancellationToken,
}

impl QueryRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model_override: None,
            preview_only: false,
            auto_execute: false,
            streaming: false,
            use_cache: true,
            copy_to_clipboard: false,
            timeout: None,
            working_dir: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    pub fn with_preview_only(mut self, preview_only: bool) -> Self {
        self.preview_only = preview_only;
        self
    }

    pub fn with_auto_execute(mut self, auto_execute: bool) -> Self {
        self.auto_execute = auto_execute;
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_clipboard(mut self, copy: bool) -> Self {
        self.copy_to_clipboard = copy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Why a command did or did not run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionDecision {
    /// The query stopped before a decision was made.
    #[default]
    Undecided,
    /// Handed to the executor.
    Executed,
    /// The request asked for a preview.
    PreviewRequested,
    /// The guardrail allows showing the command only.
    PreviewOnly,
    /// The guardrail blocked the command.
    Blocked,
    /// Safe, but neither the request nor the config asked for auto-execution.
    NotRequested,
    /// The user said no.
    Declined,
    /// Confirmation was needed and nobody could be asked.
    ConfirmationUnavailable,
}

impl ExecutionDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undecided => "undecided",
            Self::Executed => "executed",
            Self::PreviewRequested => "preview_requested",
            Self::PreviewOnly => "preview_only",
            Self::Blocked => "blocked",
            Self::NotRequested => "not_requested",
            Self::Declined => "declined",
            Self::ConfirmationUnavailable => "confirmation_unavailable",
        }
    }
}

impl std::fmt::Display for ExecutionDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about a query once it finishes (or fails).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub prompt: String,
    pub command: String,
    pub reasoning: String,
    /// Raw model reply.
    pub reply: String,
    pub assessment: RiskAssessment,
    pub context: ContextSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionResult>,
    /// Model whose output was used.
    pub model_used: String,
    pub from_cache: bool,
    pub decision: ExecutionDecision,
}
