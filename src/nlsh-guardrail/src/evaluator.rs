//! Guardrail evaluator: compiled rules applied to command text.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::assessment::{AssessmentBuilder, RiskAssessment};
use crate::command::{self, CommandWords};
use crate::enrich;
use crate::error::{GuardrailError, Result};
use crate::preview;
use crate::rules::{DangerPattern, ProtectedPathRule, RuleSet};

struct CompiledPattern {
    regex: Regex,
    rule: DangerPattern,
}

struct ResolvedPathRule {
    /// Path with the home placeholder expanded.
    resolved: String,
    rule: ProtectedPathRule,
}

impl ResolvedPathRule {
    fn matches(&self, words: &CommandWords<'_>, home: Option<&Path>) -> bool {
        let has_operation = self.rule.operations.is_empty()
            || self
                .rule
                .operations
                .iter()
                .any(|op| words.mentions_command(op));
        if !has_operation {
            return false;
        }

        let names_path = words
            .tokens
            .iter()
            .any(|t| command::token_within(t, &self.resolved, home));
        if names_path {
            return true;
        }

        // Operation as the leading word, path anywhere in the text.
        let leads = words
            .program()
            .is_some_and(|p| self.rule.operations.iter().any(|op| op == p));
        leads && command::mentions_path(words.raw, &self.resolved)
    }
}

/// Classifies command strings against an immutable rule set.
///
/// Construct once, evaluate many times. Reloading rules means building a new
/// evaluator.
pub struct GuardrailEvaluator {
    rules: RuleSet,
    patterns: Vec<CompiledPattern>,
    protected: Vec<ResolvedPathRule>,
    home: Option<PathBuf>,
}

impl GuardrailEvaluator {
    /// Compile a rule set, resolving `~` against the current user's home.
    pub fn new(rules: RuleSet) -> Result<Self> {
        Self::with_home(rules, dirs::home_dir())
    }

    /// Compile a rule set with an explicit home directory.
    pub fn with_home(rules: RuleSet, home: Option<PathBuf>) -> Result<Self> {
        let patterns = rules
            .danger_patterns
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|regex| CompiledPattern {
                        regex,
                        rule: rule.clone(),
                    })
                    .map_err(|source| GuardrailError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let protected = rules
            .protected_paths
            .iter()
            .map(|rule| ResolvedPathRule {
                resolved: command::normalize_path(&rule.path, home.as_deref()),
                rule: rule.clone(),
            })
            .collect();

        Ok(Self {
            rules,
            patterns,
            protected,
            home,
        })
    }

    /// Load a rules document (defaults when absent) and compile it.
    pub fn load(path: &Path) -> Result<Self> {
        Self::new(RuleSet::load(path)?)
    }

    /// The rule set this evaluator was built from.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns true if the trimmed command is covered by a whitelist entry.
    pub fn is_whitelisted(&self, command: &str) -> bool {
        let command = command.trim();
        self.rules.whitelist.iter().any(|entry| {
            let entry = entry.trim();
            !entry.is_empty()
                && (command == entry
                    || command
                        .strip_prefix(entry)
                        .is_some_and(|rest| rest.starts_with(' ')))
        })
    }

    /// Classify a command.
    pub fn evaluate(&self, command: &str) -> RiskAssessment {
        let command = command.trim();
        if self.is_whitelisted(command) {
            debug!(command = %command, "Command whitelisted");
            return RiskAssessment::safe();
        }

        let words = CommandWords::new(command);
        let mut builder = AssessmentBuilder::new();

        for compiled in &self.patterns {
            if compiled.regex.is_match(command) {
                builder.record_pattern(
                    &compiled.rule.pattern,
                    compiled.rule.level,
                    compiled.rule.effective_action(),
                    &compiled.rule.message,
                );
            }
        }

        let max_files = self.rules.preview.max_files;
        for protected in &self.protected {
            if !protected.matches(&words, self.home.as_deref()) {
                continue;
            }
            builder.record_protected_path(
                &protected.resolved,
                protected.rule.level,
                protected.rule.effective_action(),
            );
            let capacity = builder.preview_capacity(max_files);
            if capacity > 0 {
                builder.add_preview_entries(preview::preview_entries(
                    Path::new(&protected.resolved),
                    capacity,
                ));
            }
        }

        if !builder.level().is_safe() {
            builder.set_dry_run_suggestion(enrich::dry_run_suggestion(&words));
            builder.set_undo_hints(enrich::undo_hints(&words));
        }

        if let Some(over) = self.rules.confirmation_levels.get(&builder.level()) {
            builder.apply_override(over.action, &over.message);
        }

        let assessment = builder.build();
        debug!(
            command = %command,
            level = %assessment.level,
            action = %assessment.action,
            reasons = assessment.reasons.len(),
            "Command evaluated"
        );
        assessment
    }
}

impl std::fmt::Debug for GuardrailEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardrailEvaluator")
            .field("patterns", &self.patterns.len())
            .field("protected_paths", &self.protected.len())
            .field("whitelist", &self.rules.whitelist.len())
            .finish()
    }
}
