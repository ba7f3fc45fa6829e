//! nlsh - main entry point.
//!
//! - `nlsh <prompt>...` generates a command, assesses it and maybe runs it
//! - `nlsh check <command>` assesses a command without a model
//! - `nlsh history` and `nlsh models` inspect local state

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use nlsh_cli::cli::{Cli, LogLevel, dispatch_command};

/// Environment variable overriding `--log-level`.
const LOG_LEVEL_ENV: &str = "NLSH_LOG_LEVEL";

/// Debug log file written with `--debug`.
const DEBUG_LOG_FILE: &str = "nlsh-debug.log";

/// Keeps the non-blocking writer alive so buffered lines are flushed on exit.
struct DebugLogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Write ALL trace-level logs to ./nlsh-debug.log.
fn setup_debug_file_logging() -> Result<DebugLogGuard> {
    use std::fs::File;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let path = std::env::current_dir()?.join(DEBUG_LOG_FILE);
    let file = File::create(&path).map_err(|e| {
        anyhow::anyhow!("Failed to create {DEBUG_LOG_FILE}: {e}. Check write permissions.")
    })?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("trace"))
        .with(file_layer)
        .init();

    eprintln!("Debug mode enabled: logging to {}", path.display());
    Ok(DebugLogGuard { _guard: guard })
}

/// Precedence: `--trace`, `--verbose`, `NLSH_LOG_LEVEL`, `--log-level`.
fn effective_log_level(cli: &Cli) -> LogLevel {
    if cli.trace {
        LogLevel::Trace
    } else if cli.verbose {
        LogLevel::Debug
    } else if let Ok(env_level) = std::env::var(LOG_LEVEL_ENV) {
        LogLevel::from_str_loose(&env_level).unwrap_or(cli.log_level)
    } else {
        cli.log_level
    }
}

fn setup_logging(cli: &Cli) {
    let level = effective_log_level(cli).as_filter_str();

    // With RUST_LOG set, other crates stay quiet unless asked for.
    let filter = match std::env::var("RUST_LOG") {
        Ok(rust_log) if !rust_log.is_empty() => format!(
            "{rust_log},nlsh_cli={level},nlsh_engine={level},nlsh_guardrail={level},\
             nlsh_exec={level},nlsh_storage={level}"
        ),
        _ => level.to_string(),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _debug_guard = if cli.debug {
        Some(setup_debug_file_logging()?)
    } else {
        setup_logging(&cli);
        None
    };

    dispatch_command(cli).await
}
