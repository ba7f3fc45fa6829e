//! Command execution interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of handing a command to an executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// False when the executor was asked for a preview and did not spawn.
    pub ran: bool,
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when killed by a signal or not run.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    /// The process was killed after exceeding its timeout.
    #[serde(default)]
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Returns true if the command ran and exited with status 0.
    pub fn success(&self) -> bool {
        self.ran && self.exit_code == Some(0)
    }
}

/// Runs shell commands.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str, preview_only: bool) -> Result<ExecutionResult>;
}
