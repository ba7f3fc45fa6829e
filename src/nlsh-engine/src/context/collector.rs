//! Context collector backed by the local environment.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::tool_cache::ToolCache;
use super::{ContextCollector, ContextSnapshot, GitStatus};
use crate::config::{Config, ContextConfig, DEFAULT_TOOL_CACHE_TTL_SECS};
use crate::error::Result;
use crate::query::QueryRequest;

/// Collects cwd, shell, OS, available tools and best-effort git, Kubernetes
/// and Docker state.
///
/// Tool detection walks `PATH` for every configured tool, so results are kept
/// in a [`ToolCache`] owned by this collector.
#[derive(Debug)]
pub struct EnvironmentCollector {
    tool_cache: Mutex<ToolCache>,
}

impl Default for EnvironmentCollector {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TOOL_CACHE_TTL_SECS))
    }
}

impl EnvironmentCollector {
    pub fn new(tool_ttl: Duration) -> Self {
        Self {
            tool_cache: Mutex::new(ToolCache::new(tool_ttl)),
        }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(Duration::from_secs(config.tool_cache_ttl_secs))
    }

    async fn detect_tools(&self, wanted: &[String]) -> Vec<String> {
        let now = Instant::now();
        let cached = self.cache().get(now).map(<[String]>::to_vec);
        if let Some(tools) = cached {
            trace!(count = tools.len(), "Tool cache hit");
            return tools;
        }

        let wanted = wanted.to_vec();
        let detected = tokio::task::spawn_blocking(move || {
            let mut found: Vec<String> = wanted
                .into_iter()
                .filter(|tool| which::which(tool).is_ok())
                .collect();
            found.sort();
            found.dedup();
            found
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Tool detection failed");
            Vec::new()
        });

        debug!(count = detected.len(), "Detected tools");
        self.cache().store(detected.clone(), now);
        detected
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, ToolCache> {
        self.tool_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ContextCollector for EnvironmentCollector {
    async fn collect(&self, config: &Config, request: &QueryRequest) -> Result<ContextSnapshot> {
        let settings = &config.context;
        let cwd = match &request.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let limit = Duration::from_millis(settings.probe_timeout_ms);

        let tools = self.detect_tools(&settings.tools).await;
        let has = |tool: &str| tools.iter().any(|t| t == tool);

        let (git, kubernetes, docker) = tokio::join!(
            probe_git(&cwd, limit, settings.probe_git && has("git")),
            probe_kubernetes(&cwd, limit, settings.probe_kubernetes && has("kubectl")),
            probe_docker(&cwd, limit, settings.probe_docker && has("docker")),
        );

        Ok(ContextSnapshot {
            shell: config.execution.resolved_shell(),
            os: std::env::consts::OS.to_string(),
            env: allowed_env(settings),
            cwd,
            tools,
            git,
            kubernetes,
            docker,
        })
    }
}

fn allowed_env(settings: &ContextConfig) -> BTreeMap<String, String> {
    if !settings.include_env {
        return BTreeMap::new();
    }
    settings
        .env_allowlist
        .iter()
        .filter_map(|name| std::env::var(name).ok().map(|v| (name.clone(), v)))
        .collect()
}

async fn probe_git(cwd: &Path, limit: Duration, enabled: bool) -> Option<GitStatus> {
    if !enabled {
        return None;
    }
    let branch = run_probe("git", &["rev-parse", "--abbrev-ref", "HEAD"], cwd, limit).await?;
    let status = run_probe("git", &["status", "--porcelain"], cwd, limit).await;
    Some(GitStatus {
        branch,
        dirty: status.is_some_and(|s| !s.is_empty()),
    })
}

async fn probe_kubernetes(cwd: &Path, limit: Duration, enabled: bool) -> Option<String> {
    if !enabled {
        return None;
    }
    run_probe("kubectl", &["config", "current-context"], cwd, limit)
        .await
        .filter(|s| !s.is_empty())
}

async fn probe_docker(cwd: &Path, limit: Duration, enabled: bool) -> Option<String> {
    if !enabled {
        return None;
    }
    run_probe(
        "docker",
        &["info", "--format", "{{.ServerVersion}}"],
        cwd,
        limit,
    )
    .await
    .filter(|s| !s.is_empty())
}

/// Run a probe command, returning trimmed stdout on success.
async fn run_probe(program: &str, args: &[&str], cwd: &Path, limit: Duration) -> Option<String> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match timeout(limit, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(Ok(output)) => {
            trace!(program, status = ?output.status.code(), "Probe exited unsuccessfully");
            None
        }
        Ok(Err(e)) => {
            trace!(program, error = %e, "Probe failed to start");
            None
        }
        Err(_) => {
            debug!(program, timeout_ms = limit.as_millis() as u64, "Probe timed out");
            None
        }
    }
}

