//! Environment context handed to the model alongside the prompt.

mod collector;
mod tool_cache;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use collector::EnvironmentCollector;
pub use tool_cache::ToolCache;

use crate::config::Config;
use crate::error::Result;
use crate::query::QueryRequest;

/// Collects a context snapshot for one request.
#[async_trait]
pub trait ContextCollector: Send + Sync {
    async fn collect(&self, config: &Config, request: &QueryRequest) -> Result<ContextSnapshot>;
}

/// Working state of the user's shell at request time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub cwd: PathBuf,
    pub shell: String,
    pub os: String,
    /// Detected tools, sorted.
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitStatus>,
    /// Current Kubernetes context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<String>,
    /// Docker server version, when the daemon answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Git state of the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatus {
    pub branch: String,
    pub dirty: bool,
}

impl ContextSnapshot {
    /// Comma-separated tool list, or `none`.
    pub fn tools_summary(&self) -> String {
        if self.tools.is_empty() {
            "none".to_string()
        } else {
            self.tools.join(", ")
        }
    }

    pub fn git_summary(&self) -> String {
        match &self.git {
            Some(git) if git.dirty => format!("branch {} (uncommitted changes)", git.branch),
            Some(git) => format!("branch {} (clean)", git.branch),
            None => "not a git repository".to_string(),
        }
    }

    pub fn kubernetes_summary(&self) -> String {
        self.kubernetes
            .as_deref()
            .map(|ctx| format!("context {ctx}"))
            .unwrap_or_else(|| "unavailable".to_string())
    }

    pub fn docker_summary(&self) -> String {
        self.docker
            .as_deref()
            .map(|v| format!("server {v}"))
            .unwrap_or_else(|| "unavailable".to_string())
    }
}
