//! Risk assessment produced for a single command.

use serde::{Deserialize, Serialize};

use crate::risk::{GuardrailAction, RiskLevel};

/// Outcome of evaluating one command.
///
/// Built fresh for every evaluation and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Most severe level across every matching rule.
    pub level: RiskLevel,
    /// Required action, after any per-level override.
    pub action: GuardrailAction,
    /// Messages of every matching rule, in evaluation order.
    pub reasons: Vec<String>,
    /// Source text of every matching danger pattern.
    pub matched_patterns: Vec<String>,
    /// Resolved protected paths referenced by the command.
    pub protected_paths: Vec<String>,
    /// Entries that the command would affect, bounded by the preview rule.
    pub preview_entries: Vec<String>,
    /// Safer variant to run first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run_suggestion: Option<String>,
    /// Recovery guidance, one per topic.
    pub undo_hints: Vec<String>,
}

impl RiskAssessment {
    /// A safe, allowed assessment with no reasons.
    pub fn safe() -> Self {
        Self::default()
    }

    /// Returns true if the command must not run.
    pub fn is_blocked(&self) -> bool {
        self.action.is_blocking()
    }

    /// Returns true if the command needs an interactive confirmation.
    pub fn requires_confirmation(&self) -> bool {
        self.action.requires_confirmation()
    }
}

/// Accumulates matches into a running maximum.
#[derive(Debug, Default)]
pub(crate) struct AssessmentBuilder {
    inner: RiskAssessment,
}

impl AssessmentBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn level(&self) -> RiskLevel {
        self.inner.level
    }

    /// Raise the running level. Ties keep the earlier action.
    fn raise(&mut self, level: RiskLevel, action: GuardrailAction) {
        if level > self.inner.level {
            self.inner.level = level;
            self.inner.action = action;
        }
    }

    pub(crate) fn record_pattern(
        &mut self,
        pattern: &str,
        level: RiskLevel,
        action: GuardrailAction,
        message: &str,
    ) {
        self.inner.reasons.push(message.to_string());
        self.inner.matched_patterns.push(pattern.to_string());
        self.raise(level, action);
    }

    pub(crate) fn record_protected_path(
        &mut self,
        path: &str,
        level: RiskLevel,
        action: GuardrailAction,
    ) {
        self.inner
            .reasons
            .push(format!("Operation on protected path {path}"));
        self.inner.protected_paths.push(path.to_string());
        self.raise(level, action);
    }

    /// Remaining room for preview entries under `max`.
    pub(crate) fn preview_capacity(&self, max: usize) -> usize {
        max.saturating_sub(self.inner.preview_entries.len())
    }

    pub(crate) fn add_preview_entries(&mut self, entries: Vec<String>) {
        self.inner.preview_entries.extend(entries);
    }

    pub(crate) fn set_dry_run_suggestion(&mut self, suggestion: Option<String>) {
        self.inner.dry_run_suggestion = suggestion;
    }

    pub(crate) fn set_undo_hints(&mut self, hints: Vec<String>) {
        self.inner.undo_hints = hints;
    }

    /// Replace the action and append the override message.
    pub(crate) fn apply_override(&mut self, action: GuardrailAction, message: &str) {
        self.inner.action = action;
        if !message.is_empty() {
            self.inner.reasons.push(message.to_string());
        }
    }

    pub(crate) fn build(self) -> RiskAssessment {
        self.inner
    }
}
