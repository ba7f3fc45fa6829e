//! Guardrail rule set and its YAML document format.
//!
//! ```yaml
//! rules:
//!   danger_patterns:
//!     - pattern: '\bkubectl\s+delete\b'
//!       level: high
//!       message: Deleting Kubernetes resources
//!       action: confirm
//!   protected_paths:
//!     - path: ~/.ssh
//!       operations: [rm, mv]
//!       level: critical
//!       action: block
//!   preview:
//!     max_files: 10
//!   confirmation_levels:
//!     high:
//!       action: explicit_confirm
//!       message: High risk commands need an explicit yes
//!   whitelist:
//!     - git status
//! ```
//!
//! Every sub-section is optional. A missing sub-section keeps the built-in
//! default for that sub-section only.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GuardrailError, Result};
use crate::risk::{GuardrailAction, RiskLevel};

/// Default number of entries listed when previewing a protected path.
pub const DEFAULT_PREVIEW_MAX_FILES: usize = 10;

/// Operations that make a protected path match by default.
const DEFAULT_PROTECTED_OPERATIONS: &[&str] =
    &["rm", "mv", "chmod", "chown", "dd", "shred", "truncate"];

/// A regular expression matched against the whole command text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerPattern {
    /// Regular expression (Rust `regex` syntax).
    pub pattern: String,
    /// Severity contributed when the pattern matches.
    pub level: RiskLevel,
    /// Human-readable reason.
    pub message: String,
    /// Required action; derived from `level` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<GuardrailAction>,
}

impl DangerPattern {
    /// Create a pattern with an explicit action.
    pub fn new(
        pattern: impl Into<String>,
        level: RiskLevel,
        message: impl Into<String>,
        action: GuardrailAction,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            level,
            message: message.into(),
            action: Some(action),
        }
    }

    /// Action applied when this pattern sets the level.
    pub fn effective_action(&self) -> GuardrailAction {
        self.action.unwrap_or_else(|| self.level.default_action())
    }
}

/// A filesystem location guarded against a set of operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedPathRule {
    /// Path, optionally starting with `~`, `$HOME` or `${HOME}`.
    pub path: String,
    /// Command words that trigger the rule (`rm`, `mv`, ...). Empty means any.
    #[serde(default)]
    pub operations: Vec<String>,
    /// Severity contributed when the rule matches.
    pub level: RiskLevel,
    /// Required action; derived from `level` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<GuardrailAction>,
}

impl ProtectedPathRule {
    /// Create a rule with an explicit action.
    pub fn new<I, S>(
        path: impl Into<String>,
        operations: I,
        level: RiskLevel,
        action: GuardrailAction,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            operations: operations.into_iter().map(Into::into).collect(),
            level,
            action: Some(action),
        }
    }

    /// Action applied when this rule sets the level.
    pub fn effective_action(&self) -> GuardrailAction {
        self.action.unwrap_or_else(|| self.level.default_action())
    }
}

/// Limits for the filesystem preview of protected-path matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRule {
    /// Maximum number of entries listed.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_max_files() -> usize {
    DEFAULT_PREVIEW_MAX_FILES
}

impl Default for PreviewRule {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_PREVIEW_MAX_FILES,
        }
    }
}

/// Replaces the computed action for every assessment at a given level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationOverride {
    /// Action that replaces the computed one.
    pub action: GuardrailAction,
    /// Message appended to the reasons.
    #[serde(default)]
    pub message: String,
}

/// Complete, merged rule set. Immutable once handed to an evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub danger_patterns: Vec<DangerPattern>,
    pub protected_paths: Vec<ProtectedPathRule>,
    pub preview: PreviewRule,
    pub confirmation_levels: BTreeMap<RiskLevel, ConfirmationOverride>,
    pub whitelist: Vec<String>,
}

impl RuleSet {
    /// A rule set that matches nothing.
    pub fn empty() -> Self {
        Self {
            danger_patterns: Vec::new(),
            protected_paths: Vec::new(),
            preview: PreviewRule::default(),
            confirmation_levels: BTreeMap::new(),
            whitelist: Vec::new(),
        }
    }

    /// Load a rules document, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No guardrail rules file, using built-in rules");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| GuardrailError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::from_yaml_str(&content)?;
        debug!(
            path = %path.display(),
            patterns = rules.danger_patterns.len(),
            protected_paths = rules.protected_paths.len(),
            "Loaded guardrail rules"
        );
        Ok(rules)
    }

    /// Parse a rules document and merge it over the built-in defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let document: RuleDocument = serde_yaml::from_str(content)?;
        Ok(document.rules.unwrap_or_default().merge_over(Self::default()))
    }

    /// Set the confirmation override for a level.
    pub fn with_override(
        mut self,
        level: RiskLevel,
        action: GuardrailAction,
        message: impl Into<String>,
    ) -> Self {
        self.confirmation_levels.insert(
            level,
            ConfirmationOverride {
                action,
                message: message.into(),
            },
        );
        self
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        use GuardrailAction::*;
        use RiskLevel::*;

        let system_dirs = ["/etc", "/usr", "/bin", "/sbin", "/boot", "/var", "/lib"];
        let secret_dirs = ["~/.ssh", "~/.gnupg", "~/.aws"];

        let mut protected_paths: Vec<ProtectedPathRule> = system_dirs
            .iter()
            .map(|p| {
                ProtectedPathRule::new(
                    *p,
                    DEFAULT_PROTECTED_OPERATIONS.iter().copied(),
                    High,
                    ExplicitConfirm,
                )
            })
            .collect();
        protected_paths.extend(secret_dirs.iter().map(|p| {
            ProtectedPathRule::new(
                *p,
                DEFAULT_PROTECTED_OPERATIONS.iter().copied(),
                Critical,
                Block,
            )
        }));

        Self {
            danger_patterns: vec![
                DangerPattern::new(
                    r"\brm\s+(?:-[a-zA-Z-]+\s+)*/\*?(?:\s|$)",
                    Critical,
                    "Recursive deletion of the root filesystem",
                    Block,
                ),
                DangerPattern::new(
                    r"\bmkfs(?:\.\w+)?\b",
                    Critical,
                    "Formatting a filesystem destroys all data on the device",
                    Block,
                ),
                DangerPattern::new(
                    r"\bdd\b.*\bof=/dev/(?:sd|hd|nvme|vd|xvd|disk|mmcblk)",
                    Critical,
                    "Writing raw data to a block device",
                    Block,
                ),
                DangerPattern::new(
                    r">\s*/dev/(?:sd|hd|nvme|vd|xvd|disk|mmcblk)",
                    Critical,
                    "Redirecting output onto a block device",
                    Block,
                ),
                DangerPattern::new(
                    r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
                    Critical,
                    "Fork bomb",
                    Block,
                ),
                DangerPattern::new(
                    r"\b(?:curl|wget)\b[^|]*\|\s*(?:sudo\s+)?(?:ba|z|da|k)?sh\b",
                    High,
                    "Piping remote content into a shell runs unreviewed code",
                    ExplicitConfirm,
                ),
                DangerPattern::new(
                    r"\bchmod\s+(?:-[a-zA-Z]+\s+)*0?777\b",
                    Medium,
                    "World-writable permissions (chmod 777)",
                    SimpleConfirm,
                ),
                DangerPattern::new(
                    r"\bchown\s+-[a-zA-Z]*R",
                    Medium,
                    "Recursive ownership change",
                    Confirm,
                ),
                DangerPattern::new(
                    r"\bsudo\b",
                    Medium,
                    "Command runs with elevated privileges",
                    Confirm,
                ),
                DangerPattern::new(
                    r"\bgit\s+push\b.*(?:--force\b|--force-with-lease\b|\s-f\b)",
                    High,
                    "Force push rewrites remote history",
                    Confirm,
                ),
                DangerPattern::new(
                    r"\bgit\s+reset\s+--hard\b",
                    High,
                    "Hard reset discards uncommitted changes",
                    Confirm,
                ),
                DangerPattern::new(
                    r"\bgit\s+clean\s+-[a-zA-Z]*f",
                    Medium,
                    "git clean permanently removes untracked files",
                    Confirm,
                ),
                DangerPattern::new(
                    r"\bkubectl\s+delete\b",
                    High,
                    "Deleting Kubernetes resources",
                    Confirm,
                ),
                DangerPattern::new(
                    r"\bkubectl\s+apply\b",
                    Medium,
                    "Applying changes to a Kubernetes cluster",
                    SimpleConfirm,
                ),
                DangerPattern::new(
                    r"\bdocker\s+(?:system|volume|image|container)\s+prune\b",
                    Medium,
                    "Pruning Docker resources",
                    Confirm,
                ),
                DangerPattern::new(
                    r"\b(?:shutdown|reboot|halt|poweroff)\b",
                    High,
                    "Shutting down or rebooting the machine",
                    Confirm,
                ),
                DangerPattern::new(
                    r"\bshred\b",
                    Medium,
                    "shred irreversibly overwrites files",
                    Confirm,
                ),
                DangerPattern::new(
                    r"\brm\s+(?:-[a-zA-Z-]+\s+)*-[a-zA-Z]*[rR]",
                    High,
                    "Recursive deletion",
                    Confirm,
                ),
                DangerPattern::new(r"\brm\s", Low, "Deleting files", SimpleConfirm),
            ],
            protected_paths,
            preview: PreviewRule::default(),
            confirmation_levels: BTreeMap::new(),
            whitelist: Vec::new(),
        }
    }
}

// ============================================================================
// Document format
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct RuleDocument {
    #[serde(default)]
    rules: Option<PartialRules>,
}

/// Rules as written in a document: every sub-section may be missing.
#[derive(Debug, Default, Deserialize)]
struct PartialRules {
    #[serde(default)]
    danger_patterns: Option<Vec<DangerPattern>>,
    #[serde(default)]
    protected_paths: Option<Vec<ProtectedPathRule>>,
    #[serde(default)]
    preview: Option<PartialPreview>,
    #[serde(default)]
    confirmation_levels: Option<BTreeMap<RiskLevel, ConfirmationOverride>>,
    #[serde(default)]
    whitelist: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialPreview {
    #[serde(default)]
    max_files: Option<usize>,
}

impl PartialRules {
    fn merge_over(self, defaults: RuleSet) -> RuleSet {
        RuleSet {
            danger_patterns: self.danger_patterns.unwrap_or(defaults.danger_patterns),
            protected_paths: self.protected_paths.unwrap_or(defaults.protected_paths),
            preview: PreviewRule {
                max_files: self
                    .preview
                    .and_then(|p| p.max_files)
                    .unwrap_or(defaults.preview.max_files),
            },
            confirmation_levels: self
                .confirmation_levels
                .unwrap_or(defaults.confirmation_levels),
            whitelist: self.whitelist.unwrap_or(defaults.whitelist),
        }
    }
}
