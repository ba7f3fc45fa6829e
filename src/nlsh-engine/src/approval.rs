//! Interactive collaborators: confirmation and clipboard.

use async_trait::async_trait;
use nlsh_guardrail::{GuardrailAction, RiskLevel};

use crate::error::Result;

/// Asks the user whether a risky command may run.
#[async_trait]
pub trait ConfirmationPrompter: Send + Sync {
    /// Returns false when prompting is not possible (no TTY, disabled).
    fn enabled(&self) -> bool;

    /// Returns true only on an affirmative answer.
    async fn confirm(
        &self,
        action: GuardrailAction,
        level: RiskLevel,
        command: &str,
        reasons: &[String],
    ) -> Result<bool>;
}

/// Receives generated commands for pasting.
pub trait Clipboard: Send + Sync {
    fn enabled(&self) -> bool;

    fn copy(&self, text: &str) -> Result<()>;
}
