//! Query orchestrator - one user request end to end.
//!
//! ```text
//! config + context ─▶ candidates ─▶ cache probe ─┬─▶ hit ──────────┐
//!                                                └─▶ race ─▶ store ┤
//!                                                                  ▼
//!                           history ◀─ clipboard ◀─ execute ◀─ decide ◀─ guardrail
//! ```
//!
//! Side effects (clipboard, history, cache) never fail a query; they are
//! logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nlsh_guardrail::{GuardrailAction, GuardrailEvaluator, RiskAssessment};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::approval::{Clipboard, ConfirmationPrompter};
use crate::cache::{ResponseCache, cache_key};
use crate::candidates::resolve_candidates;
use crate::client::prompt::render_messages;
use crate::client::{GenerateOptions, Generation, ProviderFactory};
use crate::config::{Config, ConfigProvider, ModelDefinition};
use crate::context::{ContextCollector, ContextSnapshot};
use crate::error::{EngineError, QueryFailure, Result};
use crate::executor::CommandExecutor;
use crate::history::{HistoryRecord, HistoryStore};
use crate::query::{ExecutionDecision, QueryRequest, QueryResponse};
use crate::race::{RaceWinner, race};

/// Drives queries through generation, risk evaluation and execution.
///
/// Collaborators are injected through [`QueryOrchestratorBuilder`]. The
/// config provider, context collector, provider factory, guardrail and
/// executor are required; the rest are optional.
#[derive(Default, Clone)]
pub struct QueryOrchestrator {
    config: Option<Arc<dyn ConfigProvider>>,
    collector: Option<Arc<dyn ContextCollector>>,
    providers: Option<Arc<dyn ProviderFactory>>,
    guardrail: Option<Arc<GuardrailEvaluator>>,
    executor: Option<Arc<dyn CommandExecutor>>,
    prompter: Option<Arc<dyn ConfirmationPrompter>>,
    clipboard: Option<Arc<dyn Clipboard>>,
    history: Option<Arc<dyn HistoryStore>>,
    cache: Option<Arc<dyn ResponseCache>>,
}

/// Required collaborators, checked once per run.
struct Required<'a> {
    config: &'a dyn ConfigProvider,
    collector: &'a dyn ContextCollector,
    providers: &'a dyn ProviderFactory,
    guardrail: &'a GuardrailEvaluator,
    executor: &'a dyn CommandExecutor,
}

impl QueryOrchestrator {
    pub fn builder() -> QueryOrchestratorBuilder {
        QueryOrchestratorBuilder::default()
    }

    /// Run one query.
    ///
    /// On failure the partially populated response travels with the error,
    /// so callers can still show what was generated and why it stopped.
    #[instrument(skip_all, fields(prompt_len = request.prompt.len()))]
    pub async fn run(
        &self,
        request: &QueryRequest,
    ) -> std::result::Result<QueryResponse, QueryFailure> {
        let mut response = QueryResponse {
            prompt: request.prompt.clone(),
            ..QueryResponse::default()
        };

        let outcome = match self.required() {
            Ok(required) => {
                let drive = self.drive(&required, request, &mut response);
                tokio::select! {
                    biased;
                    _ = request.cancel.cancelled() => Err(EngineError::Cancelled),
                    result = with_deadline(request.timeout, drive) => result,
                }
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => Ok(response),
            Err(error) => {
                debug!(error = %error, decision = %response.decision, "Query failed");
                Err(QueryFailure::new(error, response))
            }
        }
    }

    fn required(&self) -> Result<Required<'_>> {
        Ok(Required {
            config: self
                .config
                .as_deref()
                .ok_or(EngineError::MissingCollaborator("config provider"))?,
            collector: self
                .collector
                .as_deref()
                .ok_or(EngineError::MissingCollaborator("context collector"))?,
            providers: self
                .providers
                .as_deref()
                .ok_or(EngineError::MissingCollaborator("provider factory"))?,
            guardrail: self
                .guardrail
                .as_deref()
                .ok_or(EngineError::MissingCollaborator("guardrail"))?,
            executor: self
                .executor
                .as_deref()
                .ok_or(EngineError::MissingCollaborator("command executor"))?,
        })
    }

    async fn drive(
        &self,
        required: &Required<'_>,
        request: &QueryRequest,
        response: &mut QueryResponse,
    ) -> Result<()> {
        let config = required.config.load()?;
        let context = required.collector.collect(&config, request).await?;
        response.context = context.clone();

        let candidates = resolve_candidates(&config, request.model_override.as_deref())?;

        let (model, generation, from_cache) =
            match self.cached_generation(&config, request, &candidates, &context).await {
                Some((model, generation)) => (model, generation, true),
                None => {
                    let options = GenerateOptions {
                        streaming: request.streaming,
                    };
                    let RaceWinner { model, generation } = race(
                        candidates,
                        required.providers,
                        &request.prompt,
                        &context,
                        options,
                        &request.cancel,
                    )
                    .await?;
                    self.store_generation(&config, request, &model, &context, &generation)
                        .await;
                    (model, generation, false)
                }
            };

        response.command = generation.command;
        response.reasoning = generation.reasoning;
        response.reply = generation.reply;
        response.model_used = model.name;
        response.from_cache = from_cache;

        let assessment = required.guardrail.evaluate(&response.command);
        info!(
            model = %response.model_used,
            level = %assessment.level,
            action = %assessment.action,
            from_cache,
            "Command generated"
        );
        response.assessment = assessment;

        let decision = self.decide(request, &config, &response.assessment, &response.command).await;
        response.decision = decision;

        if decision == ExecutionDecision::Blocked {
            self.save_history(request, response).await;
            return Err(EngineError::Blocked {
                command: response.command.clone(),
                reasons: response.assessment.reasons.clone(),
            });
        }

        let mut failure = None;
        if decision == ExecutionDecision::Executed {
            match required.executor.execute(&response.command, false).await {
                Ok(result) => {
                    if !result.success() {
                        failure = Some(EngineError::ExecutionFailed {
                            command: response.command.clone(),
                            exit_code: result.exit_code,
                        });
                    }
                    response.execution = Some(result);
                }
                Err(e) => failure = Some(e),
            }
        }

        self.copy_to_clipboard(&config, request, &response.command);
        self.save_history(request, response).await;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Decide whether the command runs.
    async fn decide(
        &self,
        request: &QueryRequest,
        config: &Config,
        assessment: &RiskAssessment,
        command: &str,
    ) -> ExecutionDecision {
        if request.preview_only {
            return ExecutionDecision::PreviewRequested;
        }

        match assessment.action {
            GuardrailAction::Block => ExecutionDecision::Blocked,
            GuardrailAction::PreviewOnly => ExecutionDecision::PreviewOnly,
            GuardrailAction::Allow => {
                if request.auto_execute || config.safety.auto_execute_safe {
                    ExecutionDecision::Executed
                } else {
                    ExecutionDecision::NotRequested
                }
            }
            action @ (GuardrailAction::SimpleConfirm
            | GuardrailAction::Confirm
            | GuardrailAction::ExplicitConfirm) => {
                let prompter = self
                    .prompter
                    .as_deref()
                    .filter(|p| config.safety.confirm && p.enabled());
                let Some(prompter) = prompter else {
                    debug!(action = %action, "No confirmation available, not executing");
                    return ExecutionDecision::ConfirmationUnavailable;
                };

                match prompter
                    .confirm(action, assessment.level, command, &assessment.reasons)
                    .await
                {
                    Ok(true) => ExecutionDecision::Executed,
                    Ok(false) => ExecutionDecision::Declined,
                    Err(e) => {
                        warn!(error = %e, "Confirmation failed, treating as declined");
                        ExecutionDecision::Declined
                    }
                }
            }
        }
    }

    fn cache_enabled(&self, config: &Config, request: &QueryRequest) -> Option<&dyn ResponseCache> {
        if request.use_cache && config.cache.enabled {
            self.cache.as_deref()
        } else {
            None
        }
    }

    /// Probe candidates in list order; the first hit wins.
    async fn cached_generation(
        &self,
        config: &Config,
        request: &QueryRequest,
        candidates: &[ModelDefinition],
        context: &ContextSnapshot,
    ) -> Option<(ModelDefinition, Generation)> {
        let cache = self.cache_enabled(config, request)?;
        for model in candidates {
            let key = cache_key(model, &render_messages(model, &request.prompt, context));
            match cache.get(&key).await {
                Ok(Some(generation)) => {
                    debug!(model = %model.name, "Response cache hit");
                    return Some((model.clone(), generation));
                }
                Ok(None) => {}
                Err(e) => warn!(model = %model.name, error = %e, "Response cache lookup failed"),
            }
        }
        None
    }

    async fn store_generation(
        &self,
        config: &Config,
        request: &QueryRequest,
        model: &ModelDefinition,
        context: &ContextSnapshot,
        generation: &Generation,
    ) {
        let Some(cache) = self.cache_enabled(config, request) else {
            return;
        };
        let key = cache_key(model, &render_messages(model, &request.prompt, context));
        if let Err(e) = cache.put(&key, generation).await {
            warn!(model = %model.name, error = %e, "Failed to store response in cache");
        }
    }

    fn copy_to_clipboard(&self, config: &Config, request: &QueryRequest, command: &str) {
        if !(request.copy_to_clipboard || config.execution.copy_to_clipboard) {
            return;
        }
        let Some(clipboard) = self.clipboard.as_deref().filter(|c| c.enabled()) else {
            return;
        };
        match clipboard.copy(command) {
            Ok(()) => debug!("Copied command to clipboard"),
            Err(e) => warn!(error = %e, "Failed to copy command to clipboard"),
        }
    }

    async fn save_history(&self, request: &QueryRequest, response: &QueryResponse) {
        let Some(history) = self.history.as_deref() else {
            return;
        };
        let execution = response.execution.as_ref();
        let record = HistoryRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            prompt: request.prompt.clone(),
            command: response.command.clone(),
            model: response.model_used.clone(),
            risk_level: response.assessment.level,
            action: response.assessment.action,
            executed: execution.is_some_and(|e| e.ran),
            success: execution.map(|e| e.success()),
            exit_code: execution.and_then(|e| e.exit_code),
            duration_ms: execution.map(|e| e.duration_ms),
            from_cache: response.from_cache,
        };
        if let Err(e) = history.save(&record).await {
            warn!(error = %e, "Failed to save history record");
        }
    }
}

/// Apply an optional deadline to a query.
async fn with_deadline<F>(deadline: Option<Duration>, fut: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(EngineError::Timeout(limit.as_secs()))),
        None => fut.await,
    }
}

/// Builder for [`QueryOrchestrator`].
#[derive(Default)]
pub struct QueryOrchestratorBuilder {
    inner: QueryOrchestrator,
}

impl QueryOrchestratorBuilder {
    pub fn config_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config = Some(provider);
        self
    }

    pub fn context_collector(mut self, collector: Arc<dyn ContextCollector>) -> Self {
        self.inner.collector = Some(collector);
        self
    }

    pub fn provider_factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.inner.providers = Some(factory);
        self
    }

    pub fn guardrail(mut self, evaluator: Arc<GuardrailEvaluator>) -> Self {
        self.inner.guardrail = Some(evaluator);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.inner.executor = Some(executor);
        self
    }

    pub fn prompter(mut self, prompter: Arc<dyn ConfirmationPrompter>) -> Self {
        self.inner.prompter = Some(prompter);
        self
    }

    pub fn clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.inner.clipboard = Some(clipboard);
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.inner.history = Some(history);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.inner.cache = Some(cache);
        self
    }

    pub fn build(self) -> QueryOrchestrator {
        self.inner
    }
}
