//! Candidate model selection.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::{Config, ModelDefinition};
use crate::error::{EngineError, Result};

/// Ordered, de-duplicated models eligible to answer a request.
///
/// The override (or else the configured default) comes first, followed by
/// the fallbacks in configured order. Names that do not resolve to a model
/// definition are dropped. An override that does not resolve is an error.
pub fn resolve_candidates(
    config: &Config,
    model_override: Option<&str>,
) -> Result<Vec<ModelDefinition>> {
    let override_name = model_override.map(str::trim).filter(|n| !n.is_empty());
    if let Some(name) = override_name
        && config.model(name).is_none()
    {
        return Err(EngineError::ModelNotFound {
            model: name.to_string(),
        });
    }

    let primary = override_name.unwrap_or(config.default_model.trim());
    let names = std::iter::once(primary).chain(config.fallback_models.iter().map(|n| n.trim()));

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for name in names {
        if name.is_empty() || !seen.insert(name) {
            continue;
        }
        match config.model(name) {
            Some(model) => candidates.push(model.clone()),
            None => warn!(model = %name, "Configured model has no definition, skipping"),
        }
    }

    if candidates.is_empty() {
        return Err(EngineError::NoProviders);
    }

    debug!(
        candidates = ?candidates.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        "Resolved candidate models"
    );
    Ok(candidates)
}
