//! OpenAI-compatible chat completions provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::parse::parse_generation;
use super::prompt::render_messages;
use super::types::{ChatChunk, ChatRequest, ChatResponse, ErrorBody, ResponseFormat};
use super::{GenerateOptions, Generation, Provider, ProviderFactory};
use crate::config::ModelDefinition;
use crate::context::ContextSnapshot;
use crate::error::{EngineError, Result};

/// Timeout in seconds for receiving individual SSE chunks during streaming.
const CHUNK_TIMEOUT_SECS: u64 = 60;

/// Connection timeout for provider endpoints.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout when a model sets none.
const REQUEST_TIMEOUT_SECS: u64 = 120;

const USER_AGENT: &str = concat!("nlsh/", env!("CARGO_PKG_VERSION"));

/// Builds [`ChatCompletionsProvider`]s that share one HTTP client.
#[derive(Debug, Clone)]
pub struct HttpProviderFactory {
    client: Client,
}

impl HttpProviderFactory {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                Client::new()
            });
        Self { client }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn for_model(&self, model: &ModelDefinition) -> Result<Arc<dyn Provider>> {
        if model.endpoint.trim().is_empty() {
            return Err(EngineError::provider(&model.name, "model has no endpoint"));
        }

        let api_key = match &model.auth_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                EngineError::provider(
                    &model.name,
                    format!("environment variable {var} is not set"),
                )
            })?),
            None => None,
        };
        let organization = model
            .org_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|v| !v.is_empty());

        Ok(Arc::new(ChatCompletionsProvider {
            client: self.client.clone(),
            base_url: model.endpoint.trim_end_matches('/').to_string(),
            api_key,
            organization,
        }))
    }
}

/// Provider for `POST {endpoint}/chat/completions`.
#[derive(Clone)]
pub struct ChatCompletionsProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    organization: Option<String>,
}

impl std::fmt::Debug for ChatCompletionsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsProvider")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl ChatCompletionsProvider {
    /// Provider for a base URL without credentials.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            organization: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(
        &self,
        prompt: &str,
        context: &ContextSnapshot,
        model: &ModelDefinition,
        streaming: bool,
    ) -> reqwest::RequestBuilder {
        let mut body = ChatRequest::new(&model.model, render_messages(model, prompt, context));
        body.max_tokens = model.max_tokens;
        body.temperature = model.wire.temperature;
        body.stream = streaming.then_some(true);
        body.response_format = model.wire.json_mode.then(ResponseFormat::json_object);

        let url = format!("{}/chat/completions", self.base_url);
        let request_timeout = model.wire.timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS);
        let mut req = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(request_timeout))
            .header("Content-Type", "application/json")
            .header(
                "Accept",
                if streaming {
                    "text/event-stream"
                } else {
                    "application/json"
                },
            );
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(org) = &self.organization {
            req = req.header("OpenAI-Organization", org);
        }
        for (name, value) in &model.wire.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        debug!(
            url = %url,
            model = %model.name,
            provider_model = %model.model,
            streaming,
            messages = body.messages.len(),
            "Sending chat completion request"
        );
        req.json(&body)
    }

    async fn complete(&self, req: reqwest::RequestBuilder, model: &str) -> Result<String> {
        let resp = req.send().await?;
        let resp = check_status(resp, model).await?;
        let body: ChatResponse = resp.json().await?;
        body.content()
            .map(str::to_string)
            .ok_or_else(|| EngineError::provider(model, "response has no choices"))
    }

    async fn complete_streaming(
        &self,
        req: reqwest::RequestBuilder,
        model: &str,
    ) -> Result<String> {
        let resp = req.send().await?;
        let resp = check_status(resp, model).await?;

        let stream = resp.bytes_stream().eventsource();
        let mut stream = std::pin::pin!(stream);
        let chunk_timeout = Duration::from_secs(CHUNK_TIMEOUT_SECS);
        let mut content = String::new();

        loop {
            let event = match timeout(chunk_timeout, stream.next()).await {
                Ok(Some(Ok(event))) => event,
                Ok(Some(Err(e))) => {
                    return Err(EngineError::provider(model, format!("stream error: {e}")));
                }
                Ok(None) => break,
                Err(_) => {
                    return Err(EngineError::provider(
                        model,
                        format!("SSE chunk timeout - no data received for {CHUNK_TIMEOUT_SECS} seconds"),
                    ));
                }
            };

            if event.data.is_empty() {
                continue;
            }
            if event.data == "[DONE]" {
                break;
            }
            match serde_json::from_str::<ChatChunk>(&event.data) {
                Ok(chunk) => {
                    for choice in chunk.choices {
                        if let Some(delta) = choice.delta.content {
                            content.push_str(&delta);
                        }
                    }
                }
                Err(e) => trace!(error = %e, data = %event.data, "Skipping unparseable chunk"),
            }
        }

        Ok(content)
    }
}

#[async_trait]
impl Provider for ChatCompletionsProvider {
    async fn generate(
        &self,
        prompt: &str,
        context: &ContextSnapshot,
        model: &ModelDefinition,
        options: GenerateOptions,
    ) -> Result<Generation> {
        let req = self.build_request(prompt, context, model, options.streaming);
        let content = if options.streaming {
            self.complete_streaming(req, &model.name).await?
        } else {
            self.complete(req, &model.name).await?
        };

        parse_generation(&content)
            .ok_or_else(|| EngineError::provider(&model.name, "response contained no command"))
    }
}

/// Turn a non-success response into a provider error with the server's message.
async fn check_status(resp: reqwest::Response, model: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => format!("HTTP {status}: {}", parsed.error.message),
        Err(_) => {
            let preview: String = body.chars().take(200).collect();
            if preview.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {preview}")
            }
        }
    };
    warn!(model, status = %status, "Chat completion request failed");
    Err(EngineError::provider(model, message))
}
