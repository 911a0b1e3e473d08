//! Gemini provider against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agentree::agent::{InMemorySessionService, SessionService};
use agentree::agent_loop::AgentRunner;
use agentree::config::AgentreeConfig;
use agentree::driver::run_conversation;
use agentree::error::{AgentreeError, ErrorCategory};
use agentree::provider::{GoogleProvider, ModelProvider, ModelRequest, ToolDeclaration};
use agentree::report::report_topology;
use agentree::types::{Content, FinishReason, GenerationSettings};
use agentree::util::retry::RetryPolicy;

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn config_for(server: &MockServer) -> AgentreeConfig {
    AgentreeConfig::default()
        .with_api_key("test-key")
        .with_base_url(format!("{}/v1beta", server.uri()))
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        multiplier: 1.0,
    }
}

fn request(text: &str) -> ModelRequest {
    ModelRequest {
        model: "gemini-2.0-flash".into(),
        system_instruction: Some("Be brief.".into()),
        contents: vec![Content::user_text(text)],
        tools: vec![ToolDeclaration::Builtin {
            name: "google_search".into(),
        }],
        settings: GenerationSettings::default(),
    }
}

fn text_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 3, "totalTokenCount": 10 }
    })
}

#[tokio::test]
async fn sends_key_and_parses_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "Be brief." }] },
            "tools": [{ "googleSearch": {} }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Hello")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(&config_for(&server)).unwrap();
    let response = provider.generate(&request("Hi")).await.unwrap();

    assert_eq!(response.content.first_text(), Some("Hello"));
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert_eq!(response.usage.total_tokens, 10);
    assert!(response.block_reason.is_none());
}

#[tokio::test]
async fn parses_function_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{
                    "functionCall": { "name": "SearchPlanner", "args": { "request": "plan" } }
                }]},
                "finishReason": "STOP"
            }]
        })))
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(&config_for(&server)).unwrap();
    let response = provider.generate(&request("Hi")).await.unwrap();

    let calls = response.content.function_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "SearchPlanner");
    assert_eq!(calls[0].args, json!({ "request": "plan" }));
    assert!(!calls[0].id.is_empty());
}

#[tokio::test]
async fn prompt_feedback_block_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(&config_for(&server)).unwrap();
    let response = provider.generate(&request("Hi")).await.unwrap();
    assert_eq!(response.block_reason.as_deref(), Some("prompt blocked: SAFETY"));
}

#[tokio::test]
async fn forbidden_maps_to_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(&config_for(&server))
        .unwrap()
        .with_retry_policy(fast_retry());
    let err = provider.generate(&request("Hi")).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Authentication);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("third time")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(&config_for(&server))
        .unwrap()
        .with_retry_policy(fast_retry());
    let response = provider.generate(&request("Hi")).await.unwrap();
    assert_eq!(response.content.text(), "third time");
}

#[tokio::test]
async fn retries_stop_at_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(&config_for(&server))
        .unwrap()
        .with_retry_policy(fast_retry());
    let err = provider.generate(&request("Hi")).await.unwrap_err();
    assert!(matches!(err, AgentreeError::Api { status: 503, .. }));
}

#[tokio::test]
async fn report_writer_answers_through_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Write a report on: tides" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("# Tides\nThey rise.")))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let topology = report_topology(&config).unwrap();
    let sessions = Arc::new(InMemorySessionService::new());
    sessions
        .create_session(&config.app_name, &config.user_id, Some(&config.session_id))
        .await
        .unwrap();
    let runner = AgentRunner::new(
        config.app_name.clone(),
        Arc::clone(topology.root()),
        sessions,
        Arc::new(GoogleProvider::new(&config).unwrap()),
        &config,
    );

    let mut out = Vec::new();
    let report = run_conversation(
        &runner,
        &config.user_id,
        &config.session_id,
        &["Write a report on: tides".to_string()],
        &mut out,
    )
    .await;
    assert!(report.succeeded());
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("<<< Agent Response: # Tides\nThey rise."));
}

#[tokio::test]
async fn rejected_key_surfaces_as_conversation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid. Please pass a valid API key." }
        })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let topology = report_topology(&config).unwrap();
    let sessions = Arc::new(InMemorySessionService::new());
    sessions
        .create_session(&config.app_name, &config.user_id, Some(&config.session_id))
        .await
        .unwrap();
    let runner = AgentRunner::new(
        config.app_name.clone(),
        Arc::clone(topology.root()),
        sessions,
        Arc::new(GoogleProvider::new(&config).unwrap()),
        &config,
    );

    let mut out = Vec::new();
    let report = run_conversation(
        &runner,
        &config.user_id,
        &config.session_id,
        &["Write a report on: tides".to_string()],
        &mut out,
    )
    .await;
    assert!(!report.succeeded());
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("An error occurred during the async conversation:"));
    assert!(printed.contains("API key not valid"));
}

#[tokio::test]
async fn slow_response_is_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_body("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.request_timeout_secs = 1;
    let provider = GoogleProvider::new(&config)
        .unwrap()
        .with_retry_policy(RetryPolicy {
            max_attempts: 1,
            ..fast_retry()
        });
    let err = provider.generate(&request("Hi")).await.unwrap_err();
    assert!(matches!(err, AgentreeError::Timeout(1000)), "{err:?}");
    assert_eq!(err.category(), ErrorCategory::Timeout);
    assert!(err.is_retryable());
}
