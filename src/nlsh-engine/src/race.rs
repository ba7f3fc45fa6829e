//! First-success-wins generation race across candidate models.
//!
//! Every candidate starts at once inside a shared cancellation scope. The
//! coordinator adopts the first successful result, cancels the scope and
//! stops awaiting the rest. Losers observe the cancellation at their next
//! suspension point; their results are dropped unseen.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{GenerateOptions, Generation, ProviderFactory};
use crate::config::ModelDefinition;
use crate::context::ContextSnapshot;
use crate::error::{EngineError, Result};

/// The adopted result of a race.
#[derive(Debug, Clone)]
pub struct RaceWinner {
    pub model: ModelDefinition,
    pub generation: Generation,
}

/// Race `candidates` and return the first success.
///
/// Fails with [`EngineError::AllCandidatesFailed`] naming every candidate
/// when none succeeds. Cancelling `scope` cancels every task.
pub async fn race(
    candidates: Vec<ModelDefinition>,
    factory: &dyn ProviderFactory,
    prompt: &str,
    context: &ContextSnapshot,
    options: GenerateOptions,
    scope: &CancellationToken,
) -> Result<RaceWinner> {
    let race_scope = scope.child_token();
    let prompt: Arc<str> = Arc::from(prompt);
    let context = Arc::new(context.clone());

    let mut failures: Vec<(String, String)> = Vec::new();
    let mut names = HashMap::new();
    let mut tasks = JoinSet::new();

    for model in candidates {
        let provider = match factory.for_model(&model) {
            Ok(provider) => provider,
            Err(e) => {
                debug!(model = %model.name, error = %e, "Candidate could not be created");
                failures.push((model.name, e.to_string()));
                continue;
            }
        };

        let token = race_scope.clone();
        let prompt = Arc::clone(&prompt);
        let context = Arc::clone(&context);
        let name = model.name.clone();
        let handle = tasks.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(EngineError::Cancelled),
                result = provider.generate(&prompt, &context, &model, options) => result,
            };
            (model, result)
        });
        names.insert(handle.id(), name);
    }

    let mut winner: Option<RaceWinner> = None;
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (model, Ok(generation)))) => {
                info!(model = %model.name, "Candidate won the race");
                winner = Some(RaceWinner { model, generation });
                break;
            }
            Ok((_, (model, Err(e)))) => {
                debug!(model = %model.name, error = %e, "Candidate failed");
                failures.push((model.name, e.to_string()));
            }
            Err(e) => {
                let name = names
                    .get(&e.id())
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string());
                failures.push((name, format!("task failed: {e}")));
            }
        }
    }

    race_scope.cancel();
    tasks.detach_all();

    if let Some(winner) = winner {
        return Ok(winner);
    }
    if scope.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    Err(EngineError::AllCandidatesFailed(failures))
}
