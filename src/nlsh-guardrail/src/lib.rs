#![allow(clippy::missing_errors_doc, clippy::doc_markdown)]
//! nlsh Guardrail - risk classification for generated shell commands.
//!
//! Every command produced by a model passes through [`GuardrailEvaluator`]
//! before anything runs. The evaluator is a pure function of the command
//! text and an immutable [`RuleSet`]; it never executes the command.
//!
//! Matching is textual: regular expressions over the whole command and
//! whitespace tokens for protected paths. There is no shell grammar, and the
//! result is advisory unless the caller enforces it.
//!
//! # Evaluation order
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │             Command (trimmed)              │
//! └────────────────────┬───────────────────────┘
//!                      │
//!                      ▼
//!          ┌───────────────────────┐   yes
//!          │ Whitelisted prefix?   │────────▶ SAFE / ALLOW
//!          └───────────┬───────────┘
//!                      │ no
//!                      ▼
//!      ┌──────────────────────────────────┐
//!      │ Danger patterns  (max severity)  │
//!      │ Protected paths  (max severity)  │
//!      └───────────────┬──────────────────┘
//!                      │
//!                      ▼
//!      ┌──────────────────────────────────┐
//!      │ Dry-run suggestion, undo hints   │  (only if not safe)
//!      └───────────────┬──────────────────┘
//!                      │
//!                      ▼
//!      ┌──────────────────────────────────┐
//!      │ Per-level confirmation override  │
//!      └──────────────────────────────────┘
//! ```
//!
//! All matches contribute reasons; only a strictly more severe match moves
//! the level and action, so ties keep whichever rule was evaluated first.


mod assessment;
mod command;
mod enrich;
mod error;
mod evaluator;
mod preview;
mod risk;
mod rules;

pub use assessment::RiskAssessment;
pub use error::{GuardrailError, Result};
pub use evaluator::GuardrailEvaluator;
pub use risk::{GuardrailAction, RiskLevel};
pub use rules::{
    ConfirmationOverride, DEFAULT_PREVIEW_MAX_FILES, DangerPattern, PreviewRule,
    ProtectedPathRule, RuleSet,
};

/// Evaluate a command against the built-in rules.
pub fn evaluate_with_defaults(command: &str) -> Result<RiskAssessment> {
    Ok(GuardrailEvaluator::new(RuleSet::default())?.evaluate(command))
}
