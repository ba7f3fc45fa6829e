//! Configuration types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default per-command execution timeout.
pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 300;

/// Default response cache lifetime (one day).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Default number of cached responses kept on disk.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 500;

/// Default lifetime of detected tool availability.
pub const DEFAULT_TOOL_CACHE_TTL_SECS: u64 = 300;

/// Default bound on each environment probe.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1500;

/// Tools detected by default when building the context snapshot.
pub const DEFAULT_TOOLS: &[&str] = &[
    "git", "docker", "kubectl", "helm", "terraform", "aws", "gcloud", "az", "jq", "yq", "curl",
    "wget", "rg", "fd", "fzf", "make", "cargo", "npm", "python3", "go",
];

/// Complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Primary model name.
    pub default_model: String,
    /// Fallback model names, raced alongside the primary.
    pub fallback_models: Vec<String>,
    /// Known model definitions.
    pub models: Vec<ModelDefinition>,
    pub safety: SafetyConfig,
    pub execution: ExecutionConfig,
    pub cache: CacheConfig,
    pub history: HistoryConfig,
    pub context: ContextConfig,
}

impl Config {
    /// Look up a model definition by name.
    pub fn model(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.name == name)
    }
}

/// Risk-related preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Run commands assessed as safe without a request-level opt-in.
    pub auto_execute_safe: bool,
    /// Ask for confirmation on risky commands. When false nothing risky runs.
    pub confirm: bool,
    /// Guardrail rules document. Defaults to `<nlsh home>/guardrails.yaml`.
    pub rules_path: Option<PathBuf>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            auto_execute_safe: false,
            confirm: true,
            rules_path: None,
        }
    }
}

/// Execution preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Shell used to run commands. Defaults to `$SHELL`, then `sh`.
    pub shell: Option<String>,
    /// Per-command timeout.
    pub timeout_secs: u64,
    /// Copy generated commands to the clipboard.
    pub copy_to_clipboard: bool,
    /// Overall request timeout covering generation and execution.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            shell: None,
            timeout_secs: DEFAULT_EXEC_TIMEOUT_SECS,
            copy_to_clipboard: false,
            request_timeout_secs: None,
        }
    }
}

impl ExecutionConfig {
    /// Shell to run commands with.
    pub fn resolved_shell(&self) -> String {
        self.shell
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "sh".to_string())
    }
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_entries: usize,
    /// Cache directory. Defaults to the platform cache dir.
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            dir: None,
        }
    }
}

/// History log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// History file. Defaults to `<nlsh home>/history.jsonl`.
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Environment context collection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Include allow-listed environment variables in the snapshot.
    pub include_env: bool,
    pub env_allowlist: Vec<String>,
    pub tool_cache_ttl_secs: u64,
    pub probe_git: bool,
    pub probe_kubernetes: bool,
    pub probe_docker: bool,
    pub probe_timeout_ms: u64,
    /// Tools to detect on `PATH`.
    pub tools: Vec<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            include_env: false,
            env_allowlist: Vec::new(),
            tool_cache_ttl_secs: DEFAULT_TOOL_CACHE_TTL_SECS,
            probe_git: true,
            probe_kubernetes: true,
            probe_docker: true,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            tools: DEFAULT_TOOLS.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

/// One configured AI backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Unique key referenced by `default_model` and `fallback_models`.
    pub name: String,
    /// Base URL of an OpenAI-compatible API (`.../v1`).
    pub endpoint: String,
    /// Environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_env: Option<String>,
    /// Environment variable holding the organization id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_env: Option<String>,
    /// Provider-side model identifier.
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Prompt template. Empty means the built-in template.
    #[serde(default)]
    pub prompt: Vec<PromptMessage>,
    #[serde(default)]
    pub wire: WireOptions,
}

/// A templated chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Wire-format options for a model endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Ask for a `{"command", "reasoning"}` JSON object.
    pub json_mode: bool,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Whole-request timeout for this endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}
