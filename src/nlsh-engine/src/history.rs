//! History records and the store interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nlsh_guardrail::{GuardrailAction, RiskLevel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// One line of history: what was asked, what came back, what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub command: String,
    /// Model that produced the command.
    pub model: String,
    pub risk_level: RiskLevel,
    pub action: GuardrailAction,
    pub executed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub from_cache: bool,
}

/// Persists history records.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, record: &HistoryRecord) -> Result<()>;
}
