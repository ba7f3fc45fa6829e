//! Terminal confirmation prompt.

use std::io::{self, BufRead, IsTerminal, Write};

use async_trait::async_trait;
use nlsh_guardrail::{GuardrailAction, RiskLevel};
use nlsh_engine::{ConfirmationPrompter, EngineError, Result};
use tracing::debug;

/// Asks on stderr and reads the answer from stdin.
#[derive(Debug, Clone, Copy)]
pub struct StdinPrompter {
    enabled: bool,
}

impl StdinPrompter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Enabled only when both stdin and stderr are terminals.
    pub fn detect() -> Self {
        Self::new(io::stdin().is_terminal() && io::stderr().is_terminal())
    }
}

/// Question shown for an action.
pub fn question(action: GuardrailAction) -> &'static str {
    match action {
        GuardrailAction::ExplicitConfirm => "Type 'yes' to run this command: ",
        _ => "Run this command? [y/N]: ",
    }
}

/// Whether `answer` confirms `action`.
///
/// Explicit confirmation needs the full word `yes`; the other levels also
/// take `y`. Case and surrounding whitespace are ignored.
pub fn accepts(action: GuardrailAction, answer: &str) -> bool {
    let answer = answer.trim().to_ascii_lowercase();
    match action {
        GuardrailAction::ExplicitConfirm => answer == "yes",
        _ => answer == "y" || answer == "yes",
    }
}

fn ask(
    action: GuardrailAction,
    level: RiskLevel,
    command: &str,
    reasons: &[String],
) -> io::Result<String> {
    let mut err = io::stderr().lock();
    writeln!(err)?;
    writeln!(err, "  {command}")?;
    writeln!(err, "Risk: {level}")?;
    for reason in reasons {
        writeln!(err, "  - {reason}")?;
    }
    write!(err, "{}", question(action))?;
    err.flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input)
}

#[async_trait]
impl ConfirmationPrompter for StdinPrompter {
    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn confirm(
        &self,
        action: GuardrailAction,
        level: RiskLevel,
        command: &str,
        reasons: &[String],
    ) -> Result<bool> {
        let command = command.to_string();
        let reasons = reasons.to_vec();
        let answer = tokio::task::spawn_blocking(move || ask(action, level, &command, &reasons))
            .await
            .map_err(|e| EngineError::execution(format!("confirmation prompt failed: {e}")))??;

        let accepted = accepts(action, &answer);
        debug!(action = %action, accepted, "Confirmation answered");
        Ok(accepted)
    }
}
