//! Command handlers for CLI dispatch.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use nlsh_engine::config::{Config, RULES_FILE, resolve_home_path};
use nlsh_engine::{
    ConfigProvider, EngineError, EnvironmentCollector, HttpProviderFactory, QueryFailure,
    QueryOrchestrator, QueryRequest, QueryResponse, YamlConfigProvider, resolve_candidates,
};
use nlsh_exec::LocalExecutor;
use nlsh_guardrail::{GuardrailEvaluator, RuleSet};
use nlsh_storage::{FileResponseCache, JsonlHistoryStore, cache_dir, history_path};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::args::{CheckCommand, Cli, Commands, HistoryCommand, ModelsCommand, QueryArgs};
use crate::clipboard::SystemClipboard;
use crate::prompter::StdinPrompter;
use crate::render;

/// Exit status for a command the guardrail refused.
pub const EXIT_BLOCKED: u8 = 2;

/// Exit status after Ctrl+C.
pub const EXIT_INTERRUPTED: u8 = 130;

/// Dispatch the parsed command line.
pub async fn dispatch_command(cli: Cli) -> Result<ExitCode> {
    let provider = match &cli.config {
        Some(path) => YamlConfigProvider::new(path),
        None => YamlConfigProvider::discover().context("Failed to locate the nlsh home directory")?,
    };
    debug!(config = %provider.path().display(), "Using configuration file");

    match cli.command {
        Some(Commands::Check(args)) => run_check(&provider, args),
        Some(Commands::History(args)) => run_history(&provider, args).await,
        Some(Commands::Models(args)) => run_models(&provider, args),
        None => run_query(provider, cli.query).await,
    }
}

/// Build the guardrail from the configured (or default) rules document.
fn load_guardrail(config: &Config) -> Result<GuardrailEvaluator> {
    let evaluator = match resolve_home_path(config.safety.rules_path.as_deref(), RULES_FILE) {
        Some(path) => GuardrailEvaluator::load(&path)
            .with_context(|| format!("Failed to load guardrail rules from {}", path.display()))?,
        None => GuardrailEvaluator::new(RuleSet::default())?,
    };
    Ok(evaluator)
}

fn run_check(provider: &YamlConfigProvider, args: CheckCommand) -> Result<ExitCode> {
    let command = args.command.join(" ");
    if command.trim().is_empty() {
        bail!("Nothing to check: the command is empty");
    }

    let config = provider.load()?;
    let assessment = load_guardrail(&config)?.evaluate(&command);

    if args.json {
        println!("{}", render::to_json(&assessment)?);
    } else {
        print!("{}", render::assessment(&assessment));
    }

    if assessment.is_blocked() {
        Ok(ExitCode::from(EXIT_BLOCKED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

async fn run_history(provider: &YamlConfigProvider, args: HistoryCommand) -> Result<ExitCode> {
    let config = provider.load()?;
    if !config.history.enabled {
        eprintln!("History is disabled in {}", provider.path().display());
        return Ok(ExitCode::SUCCESS);
    }

    let store = JsonlHistoryStore::new(history_path(&config)?);
    let records = store.recent(args.limit).await?;
    if args.json {
        let mut out = std::io::stdout().lock();
        for record in &records {
            writeln!(out, "{}", serde_json::to_string(record)?)?;
        }
    } else if records.is_empty() {
        eprintln!("No history yet.");
    } else {
        print!("{}", render::history(&records));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_models(provider: &YamlConfigProvider, args: ModelsCommand) -> Result<ExitCode> {
    let config = provider.load()?;
    if config.models.is_empty() {
        eprintln!("No models configured in {}", provider.path().display());
        return Ok(ExitCode::SUCCESS);
    }

    let candidates = resolve_candidates(&config, args.model.as_deref())?;
    print!("{}", render::models(&config.models, &candidates));
    Ok(ExitCode::SUCCESS)
}

fn build_orchestrator(
    provider: YamlConfigProvider,
    config: &Config,
    args: &QueryArgs,
) -> Result<QueryOrchestrator> {
    let mut executor = LocalExecutor::from_config(&config.execution);
    if let Some(dir) = &args.cwd {
        executor = executor.with_cwd(dir);
    }

    let mut builder = QueryOrchestrator::builder()
        .config_provider(Arc::new(provider))
        .context_collector(Arc::new(EnvironmentCollector::from_config(&config.context)))
        .provider_factory(Arc::new(HttpProviderFactory::new()))
        .guardrail(Arc::new(load_guardrail(config)?))
        .executor(Arc::new(executor))
        .prompter(Arc::new(StdinPrompter::detect()))
        .clipboard(Arc::new(SystemClipboard::new(true)));

    if config.history.enabled {
        builder = builder.history(Arc::new(JsonlHistoryStore::new(history_path(config)?)));
    }
    if config.cache.enabled && !args.no_cache {
        builder = builder.cache(Arc::new(FileResponseCache::from_config(
            cache_dir(config)?,
            &config.cache,
        )));
    }
    Ok(builder.build())
}

fn build_request(config: &Config, args: &QueryArgs, cancel: CancellationToken) -> QueryRequest {
    let mut request = QueryRequest::new(args.prompt_text())
        .with_preview_only(args.preview)
        .with_auto_execute(args.yes)
        .with_streaming(args.stream)
        .with_cache(!args.no_cache)
        .with_clipboard(args.copy)
        .with_cancel(cancel);

    if let Some(model) = &args.model {
        request = request.with_model(model);
    }
    if let Some(secs) = args.timeout.or(config.execution.request_timeout_secs) {
        request = request.with_timeout(Duration::from_secs(secs));
    }
    if let Some(dir) = &args.cwd {
        request = request.with_working_dir(dir);
    }
    request
}

async fn run_query(provider: YamlConfigProvider, args: QueryArgs) -> Result<ExitCode> {
    if args.prompt_text().is_empty() {
        bail!("Nothing to do: the prompt is empty");
    }

    let config = provider.load()?;
    let orchestrator = build_orchestrator(provider, &config, &args)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling query");
            on_interrupt.cancel();
        }
    });

    let request = build_request(&config, &args, cancel);
    match orchestrator.run(&request).await {
        Ok(response) => {
            report(&response, args.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            let code = report_failure(&failure, args.json)?;
            if matches!(failure.error, EngineError::Cancelled) {
                // A confirmation prompt may still be blocked reading stdin.
                std::process::exit(i32::from(EXIT_INTERRUPTED));
            }
            Ok(code)
        }
    }
}

fn report(response: &QueryResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", render::to_json(response)?);
        return Ok(());
    }

    print!("{}", render::response(response));
    if let Some(execution) = &response.execution {
        print!("{}", execution.stdout);
        eprint!("{}", execution.stderr);
    }
    Ok(())
}

fn report_failure(failure: &QueryFailure, json: bool) -> Result<ExitCode> {
    if json {
        let value = serde_json::json!({
            "error": failure.error.to_string(),
            "response": &*failure.response,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        report(&failure.response, false)?;
        if !failure.error.is_blocked() {
            eprintln!("Error: {}", failure.error);
        }
    }
    Ok(ExitCode::from(exit_status(&failure.error)))
}

/// Exit status for a failed query.
///
/// A failed command passes its own status through.
pub fn exit_status(error: &EngineError) -> u8 {
    match error {
        EngineError::Blocked { .. } => EXIT_BLOCKED,
        EngineError::Cancelled => EXIT_INTERRUPTED,
        EngineError::ExecutionFailed {
            exit_code: Some(code),
            ..
        } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
        _ => 1,
    }
}
