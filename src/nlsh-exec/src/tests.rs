//! Tests for the local executor.

use std::time::{Duration, Instant};

use nlsh_engine::CommandExecutor;
use nlsh_engine::config::ExecutionConfig;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;

#[test]
fn test_from_config() {
    let config = ExecutionConfig {
        shell: Some("/bin/bash".to_string()),
        timeout_secs: 12,
        ..ExecutionConfig::default()
    };
    let executor = LocalExecutor::from_config(&config);
    assert_eq!(executor.shell(), "/bin/bash");
    assert_eq!(executor.timeout(), Duration::from_secs(12));
}

#[tokio::test]
async fn test_preview_does_not_spawn() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("created");
    let executor = LocalExecutor::new("sh").with_cwd(dir.path());

    let result = executor.execute("touch created", true).await.unwrap();
    assert!(!result.ran);
    assert!(!result.success());
    assert!(!marker.exists());
}

#[cfg(unix)]
mod unix_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_captures_both_streams() {
        let executor = LocalExecutor::new("sh");
        let result = executor
            .execute("echo out; echo err >&2; echo more", false)
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout, "out\nmore\n");
        assert_eq!(result.stderr, "err\n");
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn test_binary_output_is_drained() {
        let executor = LocalExecutor::new("sh");
        let result = executor
            .execute(
                "printf '\\377\\n'; head -c 300000 /dev/zero | tr '\\0' a; echo; echo tail",
                false,
            )
            .await
            .unwrap();

        assert!(result.success(), "{result:?}");
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.starts_with('\u{FFFD}'));
        assert!(result.stdout.ends_with("a\ntail\n"));
        assert_eq!(result.stdout.matches('a').count(), 300_000 + 1);
    }

    #[tokio::test]
    async fn test_output_without_trailing_newline() {
        let result = LocalExecutor::new("sh")
            .execute("printf 'no newline'", false)
            .await
            .unwrap();
        assert_eq!(result.stdout, "no newline");
    }

    #[tokio::test]
    async fn test_nonzero_exit() {
        let result = LocalExecutor::new("sh")
            .execute("exit 3", false)
            .await
            .unwrap();
        assert!(result.ran);
        assert_eq!(result.exit_code, Some(3));
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = TempDir::new().unwrap();
        let executor = LocalExecutor::new("sh").with_cwd(dir.path());

        let result = executor.execute("touch created && ls", false).await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "created\n");
        assert!(dir.path().join("created").exists());
    }

    #[tokio::test]
    async fn test_extra_environment() {
        let executor = LocalExecutor::new("sh").with_env("NLSH_GREETING", "hello");
        let result = executor
            .execute("echo \"$NLSH_GREETING\"", false)
            .await
            .unwrap();
        assert_eq!(result.stdout, "hello\n");
    }

    #[tokio::test]
    async fn test_stdin_is_closed() {
        let result = LocalExecutor::new("sh")
            .execute("cat; echo done", false)
            .await
            .unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "done\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let executor = LocalExecutor::new("sh").with_timeout(Duration::from_millis(200));
        let started = Instant::now();

        let result = executor.execute("sleep 5", false).await.unwrap();
        assert!(result.timed_out);
        assert!(result.ran);
        assert_eq!(result.exit_code, None);
        assert!(!result.success());
        assert!(result.stderr.contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_missing_shell() {
        let err = LocalExecutor::new("/nonexistent/nlsh-shell")
            .execute("true", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
