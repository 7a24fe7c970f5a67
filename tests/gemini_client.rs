mod common;

use common::{jpeg, SCENARIO_PROMPT};
use omnivibe::{ErrorKind, GeminiClient, VibeClient, VibeError, VibeModel};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-pro:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn text_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
}

#[tokio::test]
async fn test_generate_sends_one_request_and_returns_text_verbatim() {
    let server = MockServer::start().await;
    let markdown = "# Vibe Report\n\n* Concrete: **on point**\n* Brass: missing  \n";

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": SCENARIO_PROMPT},
                    {"inline_data": {"mimeType": "image/jpeg"}}
                ]
            }],
            "generationConfig": {
                "temperature": 1.0,
                "topP": 0.95,
                "topK": 40,
                "maxOutputTokens": 8192,
                "responseMimeType": "text/plain"
            }
        })))
        .respond_with(text_reply(markdown))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.generate(SCENARIO_PROMPT, &jpeg()).await.unwrap();

    assert_eq!(response.text, markdown);
    assert_eq!(response.model.as_deref(), Some("gemini-1.5-pro"));
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
}

#[tokio::test]
async fn test_generate_sends_system_instruction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(json!({
            "systemInstruction": {
                "parts": [{"text": "# ROLE: Critic\n# TRACK: Review\n"}]
            }
        })))
        .respond_with(text_reply("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .model(VibeModel::Gemini25Flash)
        .preamble(omnivibe::Preamble {
            role: "Critic".into(),
            track: "Review".into(),
            directives: vec![],
        })
        .build()
        .unwrap();

    assert_eq!(client.generate("prompt", &jpeg()).await.unwrap().text, "OK");
}

#[tokio::test]
async fn test_quota_error_carries_service_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "30")
                .set_body_json(json!({
                    "error": {"code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED"}
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(SCENARIO_PROMPT, &jpeg())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteCallFailure);
    assert!(err.to_string().contains("quota exceeded"));
    assert!(matches!(
        err,
        VibeError::RateLimited { retry_after: Some(d), .. } if d == Duration::from_secs(30)
    ));
}

#[tokio::test]
async fn test_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Unsupported MIME type: text/markdown"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "API key not valid"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let err = client.generate("prompt", &jpeg()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "API error: 400 - Unsupported MIME type: text/markdown"
    );

    let err = client.generate("prompt", &jpeg()).await.unwrap_err();
    assert!(matches!(err, VibeError::Auth(ref m) if m == "API key not valid"));
}

#[tokio::test]
async fn test_transport_failure_is_remote_call_failure() {
    // Nothing listens on the discard port
    let client = GeminiClient::builder()
        .api_key("test-key")
        .base_url("http://127.0.0.1:9")
        .build()
        .unwrap();

    let err = client.generate("prompt", &jpeg()).await.unwrap_err();
    assert!(matches!(err, VibeError::Network(_)));
    assert_eq!(err.kind(), ErrorKind::RemoteCallFailure);
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(text_reply("late").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = GeminiClient::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client.generate("prompt", &jpeg()).await.unwrap_err();
    assert!(matches!(err, VibeError::Timeout(d) if d == Duration::from_millis(200)));
}

#[tokio::test]
async fn test_blocked_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate("prompt", &jpeg())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "content blocked: prompt blocked: SAFETY");
}

#[tokio::test]
async fn test_non_json_success_body_is_remote_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>proxy error</html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(SCENARIO_PROMPT, &jpeg())
        .await
        .unwrap_err();

    assert!(matches!(err, VibeError::UnexpectedResponse(_)));
    assert_eq!(err.kind(), ErrorKind::RemoteCallFailure);
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models/gemini-1.5-pro"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/gemini-1.5-pro"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).health_check().await.unwrap();
}

#[tokio::test]
async fn test_health_check_unknown_model() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models/gemini-nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "models/gemini-nope is not found"}
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .model("gemini-nope".parse().unwrap())
        .build()
        .unwrap();

    let err = client.health_check().await.unwrap_err();
    assert!(matches!(err, VibeError::Api { status: 404, .. }));
}
