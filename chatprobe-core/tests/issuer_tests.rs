//! End-to-end probe tests against a stubbed routing endpoint

use chatprobe_core::config::{ProbeConfig, SecretString};
use chatprobe_core::console::render;
use chatprobe_core::{ErrorClass, RequestIssuer};
use serde_json::{json, Value};
use std::net::TcpListener;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = "sk-test-router-key-0001";

/// Probe configuration pointing at the mock server
fn config_for(server_uri: &str) -> ProbeConfig {
    let mut config = ProbeConfig::default();
    config.endpoint.api_key = SecretString::new(TEST_KEY);
    config.endpoint.base_url = format!("{}/v1", server_uri);
    config
}

/// Run one probe and return its console line
async fn probe_line(config: &ProbeConfig) -> String {
    let issuer = RequestIssuer::from_config(config).expect("Failed to create issuer");
    render(&issuer.issue().await)
}

fn completion_body(content: Value) -> Value {
    json!({
        "id": "chatcmpl-abc",
        "object": "chat.completion",
        "created": 1_738_000_000,
        "model": "o3-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 21, "completion_tokens": 9, "total_tokens": 30}
    })
}

/// A well-formed reply prints exactly `Assistant: X`
#[tokio::test]
async fn test_success_prints_assistant_line() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", format!("Bearer {}", TEST_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!("X"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let line = probe_line(&config_for(&mock_server.uri())).await;
    assert_eq!(line, "Assistant: X");
}

/// A minimal body with only choices is enough
#[tokio::test]
async fn test_minimal_body_is_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": [{"message": {"content": "X"}}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let line = probe_line(&config_for(&mock_server.uri())).await;
    assert_eq!(line, "Assistant: X");
}

/// Empty choices are pinned to the unexpected-error bucket
#[tokio::test]
async fn test_empty_choices_is_unexpected_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x", "choices": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let line = probe_line(&config_for(&mock_server.uri())).await;
    assert!(line.starts_with("Unexpected error:"), "got: {}", line);
    assert!(line.contains("no choices"), "got: {}", line);
}

/// Null content is printed, not treated as a failure
#[tokio::test]
async fn test_null_content_prints_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(Value::Null)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let line = probe_line(&config_for(&mock_server.uri())).await;
    assert_eq!(line, "Assistant: null");
}

/// 401 with a structured body is a service-reported error
#[tokio::test]
async fn test_unauthorized_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Invalid API key",
                "type": "authentication_error",
                "code": "invalid_api_key"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let line = probe_line(&config_for(&mock_server.uri())).await;
    assert!(line.starts_with("OpenAI API error:"), "got: {}", line);
    assert!(line.contains("401"), "got: {}", line);
    assert!(line.contains("Invalid API key"), "got: {}", line);
}

/// 429 is reported once and never retried
#[tokio::test]
async fn test_rate_limit_is_api_error_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "3")
                .set_body_json(json!({
                    "error": {"message": "Rate limit reached", "type": "rate_limit_error"}
                })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let issuer = RequestIssuer::from_config(&config_for(&mock_server.uri())).unwrap();
    let outcome = issuer.issue().await;

    let err = outcome.as_ref().unwrap_err();
    assert_eq!(err.class(), ErrorClass::Api);
    let api = err.as_api_error().unwrap();
    assert_eq!(api.status, 429);
    assert_eq!(api.retry_after, Some(std::time::Duration::from_secs(3)));

    let line = render(&outcome);
    assert!(line.starts_with("OpenAI API error: 429 Rate limit reached"), "got: {}", line);

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
}

/// 5xx are service-reported too, and still sent only once
#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let line = probe_line(&config_for(&mock_server.uri())).await;
    assert_eq!(
        line.split(" [request_id").next().unwrap(),
        "OpenAI API error: 503 upstream unavailable"
    );
}

/// Connection refused lands in the unexpected bucket
#[tokio::test]
async fn test_connection_refused_is_unexpected_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut config = ProbeConfig::default();
    config.endpoint.api_key = SecretString::new(TEST_KEY);
    config.endpoint.base_url = format!("http://127.0.0.1:{}/v1", port);

    let line = probe_line(&config).await;
    assert!(line.starts_with("Unexpected error:"), "got: {}", line);
}

/// The body carries the configured model and the fixed two-message conversation
#[tokio::test]
async fn test_request_body_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!("ok"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let line = probe_line(&config_for(&mock_server.uri())).await;
    assert_eq!(line, "Assistant: ok");

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);

    let request = &received[0];
    assert_eq!(
        request.headers.get("content-type").unwrap().to_str().unwrap(),
        "application/json"
    );
    assert!(request.headers.get("x-request-id").is_some());

    let body: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(
        body,
        json!({
            "model": "cline/o3-mini:high",
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "Hello! How can you help me today?"}
            ]
        })
    );
}

/// A configured model identifier is sent verbatim
#[tokio::test]
async fn test_configured_model_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!("ok"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = config_for(&mock_server.uri());
    config.request.model = "openai/gpt-4o-mini".to_string();
    probe_line(&config).await;

    let received = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["model"], "openai/gpt-4o-mini");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}
