//! Runs commands through the user's shell on this machine.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nlsh_engine::config::{DEFAULT_EXEC_TIMEOUT_SECS, ExecutionConfig};
use nlsh_engine::{CommandExecutor, EngineError, ExecutionResult, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Executes a command string with `<shell> -c`.
///
/// Stdin is closed so interactive prompts fail fast instead of hanging.
/// Stdout and stderr are captured concurrently. A command that outlives the
/// timeout is killed and reported with `timed_out` set.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    shell: String,
    timeout: Duration,
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}

impl LocalExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            timeout: Duration::from_secs(DEFAULT_EXEC_TIMEOUT_SECS),
            cwd: None,
            env: HashMap::new(),
        }
    }

    /// Executor for the configured shell and timeout.
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(config.resolved_shell()).with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run commands in `cwd` instead of the process working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(shell_flag(&self.shell)).arg(command);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CommandExecutor for LocalExecutor {
    async fn execute(&self, command: &str, preview_only: bool) -> Result<ExecutionResult> {
        if preview_only {
            debug!(command = %command, "Preview only, not spawning");
            return Ok(ExecutionResult::default());
        }

        let start = Instant::now();
        let mut child = self.command(command).spawn().map_err(|e| {
            EngineError::execution(format!("failed to spawn {}: {e}", self.shell))
        })?;
        info!(command = %command, shell = %self.shell, pid = ?child.id(), "Executing command");

        let mut result = match tokio::time::timeout(self.timeout, wait_for_output(&mut child)).await
        {
            Ok(output) => output?,
            Err(_) => {
                warn!(
                    command = %command,
                    timeout_secs = self.timeout.as_secs(),
                    "Command timed out, killing"
                );
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed out command");
                }
                ExecutionResult {
                    ran: true,
                    stderr: format!("command timed out after {}s", self.timeout.as_secs()),
                    timed_out: true,
                    ..ExecutionResult::default()
                }
            }
        };

        result.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            exit_code = ?result.exit_code,
            duration_ms = result.duration_ms,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "Command finished"
        );
        Ok(result)
    }
}

/// Read both streams to the end, then reap the child.
async fn wait_for_output(child: &mut Child) -> Result<ExecutionResult> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (stdout, stderr) = tokio::join!(read_stream(stdout), read_stream(stderr));

    let status = child
        .wait()
        .await
        .map_err(|e| EngineError::execution(format!("failed to wait for command: {e}")))?;

    Ok(ExecutionResult {
        ran: true,
        stdout,
        stderr,
        exit_code: status.code(),
        duration_ms: 0,
        timed_out: false,
    })
}

/// Drain a pipe to EOF. Output that is not UTF-8 is decoded lossily so the
/// child never sees a closed pipe.
async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut buf = Vec::new();
    if let Err(e) = stream.read_to_end(&mut buf).await {
        warn!(error = %e, "Failed to read command output");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn shell_flag(shell: &str) -> &'static str {
    let name = std::path::Path::new(shell)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(shell)
        .to_ascii_lowercase();
    match name.as_str() {
        "cmd" => "/C",
        "powershell" | "pwsh" => "-Command",
        _ => "-c",
    }
}
