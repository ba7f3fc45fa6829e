//! End-to-end tests for the query orchestrator with in-memory collaborators.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use nlsh_guardrail::{DangerPattern, GuardrailAction, GuardrailEvaluator, RiskLevel, RuleSet};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use super::fakes::{
    FixedCollector, Harness, RecordingExecutor, Script, ScriptedFactory, ScriptedPrompter, config,
};
use crate::config::{Config, StaticConfigProvider};
use crate::error::EngineError;
use crate::orchestrator::QueryOrchestrator;
use crate::query::{ExecutionDecision, QueryRequest};

fn single(command: &str) -> (Config, ScriptedFactory) {
    (
        config("a", &[], &["a"]),
        ScriptedFactory::new().script("a", Script::ok(command, 0)),
    )
}

#[tokio::test]
async fn test_blocked_command_never_runs() {
    let (cfg, factory) = single("rm -rf /");
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let request = QueryRequest::new("wipe everything")
        .with_auto_execute(true)
        .with_clipboard(true);
    let failure = orchestrator.run(&request).await.unwrap_err();

    assert!(failure.error.is_blocked());
    let EngineError::Blocked { command, reasons } = &failure.error else {
        panic!("expected Blocked, got {:?}", failure.error);
    };
    assert_eq!(command, "rm -rf /");
    assert!(!reasons.is_empty());

    assert_eq!(failure.response.decision, ExecutionDecision::Blocked);
    assert_eq!(failure.response.assessment.level, RiskLevel::Critical);
    assert_eq!(failure.response.assessment.action, GuardrailAction::Block);
    assert!(failure.response.execution.is_none());
    assert!(parts.executor.commands().is_empty());
    assert!(parts.clipboard.copied.lock().unwrap().is_empty());

    let history = parts.history.records();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].command, "rm -rf /");
    assert!(!history[0].executed);
    assert_eq!(history[0].action, GuardrailAction::Block);
}

#[tokio::test]
async fn test_safe_command_needs_an_opt_in() {
    let (cfg, factory) = single("ls -la");
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let response = orchestrator
        .run(&QueryRequest::new("list files"))
        .await
        .unwrap();

    assert_eq!(response.command, "ls -la");
    assert_eq!(response.assessment.level, RiskLevel::Safe);
    assert_eq!(response.decision, ExecutionDecision::NotRequested);
    assert!(response.execution.is_none());
    assert!(parts.executor.commands().is_empty());
}

#[tokio::test]
async fn test_safe_command_runs_with_auto_execute() {
    let (cfg, factory) = single("ls -la");
    let (orchestrator, parts) = Harness::new(cfg, factory)
        .guardrail(GuardrailEvaluator::with_home(RuleSet::empty(), None).unwrap())
        .build();

    let response = orchestrator
        .run(&QueryRequest::new("list files").with_auto_execute(true))
        .await
        .unwrap();

    assert_eq!(response.decision, ExecutionDecision::Executed);
    assert_eq!(parts.executor.commands(), vec!["ls -la"]);
    let execution = response.execution.unwrap();
    assert!(execution.success());
    assert_eq!(execution.stdout, "output\n");

    let history = parts.history.records();
    assert_eq!(history.len(), 1);
    assert!(history[0].executed);
    assert_eq!(history[0].success, Some(true));
    assert_eq!(history[0].exit_code, Some(0));
    assert_eq!(history[0].model, "a");
}

#[tokio::test]
async fn test_config_can_auto_execute_safe_commands() {
    let (mut cfg, factory) = single("whoami");
    cfg.safety.auto_execute_safe = true;
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let response = orchestrator.run(&QueryRequest::new("who am i")).await.unwrap();
    assert_eq!(response.decision, ExecutionDecision::Executed);
    assert_eq!(parts.executor.commands(), vec!["whoami"]);
}

#[tokio::test]
async fn test_preview_request_wins_over_auto_execute() {
    let (cfg, factory) = single("ls");
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let request = QueryRequest::new("list")
        .with_auto_execute(true)
        .with_preview_only(true);
    let response = orchestrator.run(&request).await.unwrap();

    assert_eq!(response.decision, ExecutionDecision::PreviewRequested);
    assert!(parts.executor.commands().is_empty());
}

#[tokio::test]
async fn test_preview_only_action_never_runs() {
    let (cfg, factory) = single("terraform destroy");
    let mut rules = RuleSet::empty();
    rules.danger_patterns.push(DangerPattern::new(
        r"\bterraform\s+destroy\b",
        RiskLevel::High,
        "Destroys managed infrastructure",
        GuardrailAction::PreviewOnly,
    ));
    let prompter = Arc::new(ScriptedPrompter::answering(true));
    let (orchestrator, parts) = Harness::new(cfg, factory)
        .guardrail(GuardrailEvaluator::with_home(rules, None).unwrap())
        .prompter(prompter.clone())
        .build();

    let response = orchestrator
        .run(&QueryRequest::new("tear it down").with_auto_execute(true))
        .await
        .unwrap();

    assert_eq!(response.decision, ExecutionDecision::PreviewOnly);
    assert!(prompter.asked().is_empty());
    assert!(parts.executor.commands().is_empty());
}

#[tokio::test]
async fn test_declined_confirmation_does_not_run() {
    let (cfg, factory) = single("chmod 777 deploy.sh");
    let prompter = Arc::new(ScriptedPrompter::answering(false));
    let (orchestrator, parts) = Harness::new(cfg, factory)
        .prompter(prompter.clone())
        .build();

    let response = orchestrator
        .run(&QueryRequest::new("make it executable for everyone"))
        .await
        .unwrap();

    assert_eq!(response.decision, ExecutionDecision::Declined);
    assert_eq!(
        prompter.asked(),
        vec![(
            GuardrailAction::SimpleConfirm,
            RiskLevel::Medium,
            "chmod 777 deploy.sh".to_string()
        )]
    );
    assert!(parts.executor.commands().is_empty());

    let history = parts.history.records();
    assert_eq!(history.len(), 1);
    assert!(!history[0].executed);
    assert_eq!(history[0].success, None);
}

#[tokio::test]
async fn test_accepted_confirmation_runs() {
    let (cfg, factory) = single("chmod 777 deploy.sh");
    let prompter = Arc::new(ScriptedPrompter::answering(true));
    let (orchestrator, parts) = Harness::new(cfg, factory)
        .prompter(prompter)
        .build();

    let response = orchestrator
        .run(&QueryRequest::new("make it executable"))
        .await
        .unwrap();

    assert_eq!(response.decision, ExecutionDecision::Executed);
    assert_eq!(parts.executor.commands(), vec!["chmod 777 deploy.sh"]);
}

#[tokio::test]
async fn test_confirmation_without_prompter() {
    let (cfg, factory) = single("sudo systemctl restart nginx");
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let response = orchestrator
        .run(&QueryRequest::new("restart nginx").with_auto_execute(true))
        .await
        .unwrap();

    assert_eq!(response.decision, ExecutionDecision::ConfirmationUnavailable);
    assert!(parts.executor.commands().is_empty());
}

#[tokio::test]
async fn test_disabled_prompter_is_not_asked() {
    let (cfg, factory) = single("sudo reboot");
    let prompter = Arc::new(ScriptedPrompter::disabled());
    let (orchestrator, _parts) = Harness::new(cfg, factory)
        .prompter(prompter.clone())
        .build();

    let response = orchestrator.run(&QueryRequest::new("reboot")).await.unwrap();
    assert_eq!(response.decision, ExecutionDecision::ConfirmationUnavailable);
    assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn test_confirm_disabled_in_config() {
    let (mut cfg, factory) = single("chmod 777 deploy.sh");
    cfg.safety.confirm = false;
    let prompter = Arc::new(ScriptedPrompter::answering(true));
    let (orchestrator, parts) = Harness::new(cfg, factory)
        .prompter(prompter.clone())
        .build();

    let response = orchestrator.run(&QueryRequest::new("chmod")).await.unwrap();
    assert_eq!(response.decision, ExecutionDecision::ConfirmationUnavailable);
    assert!(prompter.asked().is_empty());
    assert!(parts.executor.commands().is_empty());
}

#[tokio::test]
async fn test_prompter_error_counts_as_decline() {
    let (cfg, factory) = single("chmod 777 deploy.sh");
    let prompter = Arc::new(ScriptedPrompter::failing());
    let (orchestrator, parts) = Harness::new(cfg, factory)
        .prompter(prompter)
        .build();

    let response = orchestrator.run(&QueryRequest::new("chmod")).await.unwrap();
    assert_eq!(response.decision, ExecutionDecision::Declined);
    assert!(parts.executor.commands().is_empty());
}

#[tokio::test]
async fn test_failed_command_reports_exit_code() {
    let (cfg, factory) = single("false");
    let (orchestrator, parts) =
        Harness::with_executor(cfg, factory, RecordingExecutor::new(2)).build();

    let failure = orchestrator
        .run(&QueryRequest::new("fail").with_auto_execute(true))
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        EngineError::ExecutionFailed {
            exit_code: Some(2),
            ..
        }
    ));
    assert_eq!(failure.error.to_string(), "Command failed (exit code 2): false");
    assert_eq!(failure.response.execution.as_ref().unwrap().exit_code, Some(2));

    let history = parts.history.records();
    assert_eq!(history[0].success, Some(false));
    assert_eq!(history[0].exit_code, Some(2));
}

#[tokio::test]
async fn test_fallback_model_answers_when_primary_fails() {
    let cfg = config("a", &["b"], &["a", "b"]);
    let factory = ScriptedFactory::new()
        .script("a", Script::fail("HTTP 503", 5))
        .script("b", Script::ok("du -sh .", 30));
    let (orchestrator, _parts) = Harness::new(cfg, factory).build();

    let response = orchestrator
        .run(&QueryRequest::new("how big is this directory"))
        .await
        .unwrap();
    assert_eq!(response.model_used, "b");
    assert_eq!(response.command, "du -sh .");
    assert_eq!(response.reasoning, "from b");
    assert_eq!(response.context.shell, "bash");
}

#[tokio::test]
async fn test_late_primary_failure_does_not_leak_into_response() {
    let cfg = config("a", &["b"], &["a", "b"]);
    let factory = ScriptedFactory::new()
        .script("a", Script::fail("HTTP 503 from a", 80))
        .script("b", Script::ok("ls -la", 5));
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let response = orchestrator
        .run(&QueryRequest::new("list files"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(response.model_used, "b");
    assert_eq!(response.command, "ls -la");
    assert_eq!(response.reasoning, "from b");
    assert_eq!(response.reply, "{\"command\": \"ls -la\"}");
    assert!(!response.reasoning.contains("HTTP 503"));
    assert!(!response.reply.contains("HTTP 503"));
    assert_eq!(parts.factory_log.finished(), vec!["b"]);

    let history = parts.history.records();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].model, "b");
    assert_eq!(history[0].command, "ls -la");
}

#[tokio::test]
async fn test_all_models_failing() {
    let cfg = config("a", &["b"], &["a", "b"]);
    let factory = ScriptedFactory::new()
        .script("a", Script::fail("HTTP 500", 5))
        .script("b", Script::fail("HTTP 429", 5));
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let failure = orchestrator
        .run(&QueryRequest::new("anything"))
        .await
        .unwrap_err();
    assert!(matches!(failure.error, EngineError::AllCandidatesFailed(ref f) if f.len() == 2));
    assert_eq!(failure.response.decision, ExecutionDecision::Undecided);
    assert!(failure.response.command.is_empty());
    assert!(parts.history.records().is_empty());
}

#[tokio::test]
async fn test_unknown_model_override() {
    let (cfg, factory) = single("ls");
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let failure = orchestrator
        .run(&QueryRequest::new("list").with_model("ghost"))
        .await
        .unwrap_err();
    assert!(failure.error.is_config_error());
    assert_eq!(parts.factory_log.started.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_collaborator_fails_before_generation() {
    let (cfg, factory) = single("ls");
    let factory = Arc::new(factory);
    let orchestrator = QueryOrchestrator::builder()
        .config_provider(Arc::new(StaticConfigProvider::new(cfg)))
        .context_collector(Arc::new(FixedCollector))
        .provider_factory(factory.clone())
        .guardrail(Arc::new(
            GuardrailEvaluator::with_home(RuleSet::default(), None).unwrap(),
        ))
        .build();

    let failure = orchestrator
        .run(&QueryRequest::new("list"))
        .await
        .unwrap_err();
    assert!(matches!(
        failure.error,
        EngineError::MissingCollaborator("command executor")
    ));
    assert_eq!(failure.response.prompt, "list");
    assert_eq!(factory.log.started.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_deadline_during_generation() {
    let cfg = config("a", &[], &["a"]);
    let factory = ScriptedFactory::new().script("a", Script::hang());
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let failure = orchestrator
        .run(&QueryRequest::new("anything").with_timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(failure.error, EngineError::Timeout(_)));
    assert!(failure.response.command.is_empty());
    assert!(parts.executor.commands().is_empty());
}

#[tokio::test]
async fn test_deadline_during_execution_keeps_partial_response() {
    let (cfg, factory) = single("sleep 10");
    let (orchestrator, parts) = Harness::with_executor(
        cfg,
        factory,
        RecordingExecutor::slow(Duration::from_secs(10)),
    )
    .build();

    let request = QueryRequest::new("wait")
        .with_auto_execute(true)
        .with_timeout(Duration::from_millis(100));
    let failure = orchestrator.run(&request).await.unwrap_err();

    assert!(matches!(failure.error, EngineError::Timeout(_)));
    assert_eq!(failure.response.command, "sleep 10");
    assert_eq!(failure.response.decision, ExecutionDecision::Executed);
    assert!(failure.response.execution.is_none());
    assert_eq!(parts.executor.commands(), vec!["sleep 10"]);
}

#[tokio::test]
async fn test_cancellation() {
    let cfg = config("a", &[], &["a"]);
    let factory = ScriptedFactory::new().script("a", Script::hang());
    let (orchestrator, _parts) = Harness::new(cfg, factory).build();

    let cancel = CancellationToken::new();
    let request = QueryRequest::new("anything").with_cancel(cancel.clone());
    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    let failure = orchestrator.run(&request).await.unwrap_err();
    assert!(matches!(failure.error, EngineError::Cancelled));
    trigger.await.unwrap();
}

#[tokio::test]
async fn test_cache_hit_skips_generation() {
    let (cfg, factory) = single("git status");
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    let first = orchestrator.run(&QueryRequest::new("status")).await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(parts.cache.len(), 1);
    assert_eq!(parts.factory_log.started.load(Ordering::SeqCst), 1);

    let second = orchestrator.run(&QueryRequest::new("status")).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.command, "git status");
    assert_eq!(second.model_used, "a");
    assert_eq!(parts.factory_log.started.load(Ordering::SeqCst), 1);
    assert!(parts.history.records()[1].from_cache);

    let third = orchestrator
        .run(&QueryRequest::new("status").with_cache(false))
        .await
        .unwrap();
    assert!(!third.from_cache);
    assert_eq!(parts.factory_log.started.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_disabled_in_config() {
    let (mut cfg, factory) = single("git log");
    cfg.cache.enabled = false;
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    orchestrator.run(&QueryRequest::new("log")).await.unwrap();
    orchestrator.run(&QueryRequest::new("log")).await.unwrap();
    assert_eq!(parts.cache.len(), 0);
    assert_eq!(parts.factory_log.started.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_clipboard_receives_command() {
    let (cfg, factory) = single("echo hello");
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    orchestrator
        .run(&QueryRequest::new("say hello").with_clipboard(true))
        .await
        .unwrap();
    assert_eq!(*parts.clipboard.copied.lock().unwrap(), vec!["echo hello"]);
}

#[tokio::test]
async fn test_clipboard_untouched_by_default() {
    let (cfg, factory) = single("echo hello");
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    orchestrator.run(&QueryRequest::new("say hello")).await.unwrap();
    assert!(parts.clipboard.copied.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_streaming_request_reaches_provider() {
    let (cfg, factory) = single("date");
    let (orchestrator, parts) = Harness::new(cfg, factory).build();

    orchestrator
        .run(&QueryRequest::new("what time is it").with_streaming(true))
        .await
        .unwrap();
    assert_eq!(*parts.factory_log.streaming.lock().unwrap(), vec![true]);
}
