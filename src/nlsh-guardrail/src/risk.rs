//! Risk taxonomy: severity levels and the actions a caller must take.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GuardrailError;

/// Severity of a command, totally ordered from `Safe` to `Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Nothing matched.
    #[default]
    Safe,
    /// Minor side effects.
    Low,
    /// Side effects worth a second look.
    Medium,
    /// Hard to undo.
    High,
    /// Destructive or irreversible.
    Critical,
}

impl RiskLevel {
    /// All levels in ascending severity.
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Safe,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Snake-case name used in rule documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Returns true for [`RiskLevel::Safe`].
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe)
    }

    /// Action used when a rule does not name one explicitly.
    pub fn default_action(&self) -> GuardrailAction {
        match self {
            Self::Safe => GuardrailAction::Allow,
            Self::Low => GuardrailAction::SimpleConfirm,
            Self::Medium => GuardrailAction::Confirm,
            Self::High => GuardrailAction::ExplicitConfirm,
            Self::Critical => GuardrailAction::Block,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = GuardrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" => Ok(Self::Safe),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(GuardrailError::UnknownLevel(other.to_string())),
        }
    }
}

/// What the caller must do before running a command.
///
/// Not ordered against [`RiskLevel`]: each rule carries its own action and a
/// per-level override may replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailAction {
    /// Run without asking.
    #[default]
    Allow,
    /// Show the command, never run it.
    PreviewOnly,
    /// A single y/n prompt.
    SimpleConfirm,
    /// A prompt that shows the reasons.
    Confirm,
    /// The user has to type an explicit acknowledgement.
    ExplicitConfirm,
    /// Never run.
    Block,
}

impl GuardrailAction {
    /// Snake-case name used in rule documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::PreviewOnly => "preview_only",
            Self::SimpleConfirm => "simple_confirm",
            Self::Confirm => "confirm",
            Self::ExplicitConfirm => "explicit_confirm",
            Self::Block => "block",
        }
    }

    /// Returns true if running the command needs an interactive confirmation.
    pub fn requires_confirmation(&self) -> bool {
        matches!(
            self,
            Self::SimpleConfirm | Self::Confirm | Self::ExplicitConfirm
        )
    }

    /// Returns true if the command must never run.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Block)
    }
}

impl fmt::Display for GuardrailAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuardrailAction {
    type Err = GuardrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "allow" => Ok(Self::Allow),
            "preview_only" | "preview" => Ok(Self::PreviewOnly),
            "simple_confirm" => Ok(Self::SimpleConfirm),
            "confirm" => Ok(Self::Confirm),
            "explicit_confirm" => Ok(Self::ExplicitConfirm),
            "block" => Ok(Self::Block),
            other => Err(GuardrailError::UnknownAction(other.to_string())),
        }
    }
}
