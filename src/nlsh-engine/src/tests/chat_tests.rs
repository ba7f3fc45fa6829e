//! Tests for the chat completions provider against a mock server.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fakes::snapshot;
use crate::client::{
    ChatCompletionsProvider, GenerateOptions, HttpProviderFactory, Provider, ProviderFactory,
};
use crate::config::{ModelDefinition, WireOptions};
use crate::error::EngineError;

fn definition(endpoint: &str) -> ModelDefinition {
    ModelDefinition {
        name: "mock".to_string(),
        endpoint: endpoint.to_string(),
        model: "gpt-test".to_string(),
        ..ModelDefinition::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_json_mode_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "response_format": {"type": "json_object"},
            "max_tokens": 256
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"command": "ls -la", "reasoning": "Lists all files with details"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut model = definition(&format!("{}/v1/", server.uri()));
    model.max_tokens = Some(256);
    model.wire = WireOptions {
        json_mode: true,
        ..WireOptions::default()
    };
    let provider = ChatCompletionsProvider::new(&model.endpoint).with_api_key("sk-test");
    assert_eq!(provider.base_url(), format!("{}/v1", server.uri()));

    let generation = provider
        .generate("list files", &snapshot(), &model, GenerateOptions::default())
        .await
        .unwrap();
    assert_eq!(generation.command, "ls -la");
    assert_eq!(generation.reasoning, "Lists all files with details");
    assert!(generation.reply.contains("\"command\""));
}

#[tokio::test]
async fn test_rendered_prompt_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "show disk usage"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("df -h")))
        .expect(1)
        .mount(&server)
        .await;

    let mut model = definition(&server.uri());
    model.prompt = vec![crate::config::PromptMessage::new("user", "{{prompt}}")];
    let provider = ChatCompletionsProvider::new(server.uri());

    let generation = provider
        .generate("show disk usage", &snapshot(), &model, GenerateOptions::default())
        .await
        .unwrap();
    assert_eq!(generation.command, "df -h");
}

#[tokio::test]
async fn test_streaming_completion() {
    let server = MockServer::start().await;
    let chunks = [
        "```bash\\n",
        "find . -name '*.log'",
        " -mtime +7\\n```\\n",
        "Finds old log files.",
    ];
    let mut body = String::new();
    for chunk in chunks {
        body.push_str(&format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{chunk}\"}}}}]}}\n\n"
        ));
    }
    body.push_str("data: [DONE]\n\n");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("accept", "text/event-stream"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let model = definition(&server.uri());
    let provider = ChatCompletionsProvider::new(server.uri());
    let generation = provider
        .generate(
            "find old logs",
            &snapshot(),
            &model,
            GenerateOptions { streaming: true },
        )
        .await
        .unwrap();

    assert_eq!(generation.command, "find . -name '*.log' -mtime +7");
    assert_eq!(generation.reasoning, "Finds old log files.");
}

#[tokio::test]
async fn test_http_error_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let model = definition(&server.uri());
    let err = ChatCompletionsProvider::new(server.uri())
        .generate("anything", &snapshot(), &model, GenerateOptions::default())
        .await
        .unwrap_err();

    let EngineError::Provider { model, message } = &err else {
        panic!("expected provider error, got {err:?}");
    };
    assert_eq!(model, "mock");
    assert_eq!(message, "HTTP 401 Unauthorized: Invalid API key");
}

#[tokio::test]
async fn test_http_error_with_plain_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let model = definition(&server.uri());
    let err = ChatCompletionsProvider::new(server.uri())
        .generate("anything", &snapshot(), &model, GenerateOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("HTTP 502 Bad Gateway: upstream unavailable"));
}

#[tokio::test]
async fn test_empty_reply_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
        .mount(&server)
        .await;

    let model = definition(&server.uri());
    let err = ChatCompletionsProvider::new(server.uri())
        .generate("anything", &snapshot(), &model, GenerateOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("response contained no command"));
}

#[tokio::test]
async fn test_custom_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("x-team", "platform"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("uname -a")))
        .expect(1)
        .mount(&server)
        .await;

    let mut model = definition(&server.uri());
    model.wire.headers = BTreeMap::from([("x-team".to_string(), "platform".to_string())]);
    let provider = HttpProviderFactory::new().for_model(&model).unwrap();

    let generation = provider
        .generate("kernel version", &snapshot(), &model, GenerateOptions::default())
        .await
        .unwrap();
    assert_eq!(generation.command, "uname -a");
}

#[test]
fn test_factory_rejects_missing_endpoint() {
    let model = definition("  ");
    let Err(err) = HttpProviderFactory::new().for_model(&model) else {
        panic!("expected the factory to reject the model");
    };
    assert!(err.to_string().contains("model has no endpoint"));
}

#[test]
fn test_factory_requires_configured_key() {
    let mut model = definition("http://localhost:1/v1");
    model.auth_env = Some("NLSH_TEST_KEY_THAT_IS_NEVER_SET".to_string());
    let Err(err) = HttpProviderFactory::new().for_model(&model) else {
        panic!("expected the factory to reject the model");
    };
    assert!(matches!(err, EngineError::Provider { .. }));
    assert!(err.to_string().contains("NLSH_TEST_KEY_THAT_IS_NEVER_SET"));
}
