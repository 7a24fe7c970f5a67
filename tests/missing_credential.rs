use omnivibe::config::API_KEY_ENV_VARS;
use omnivibe::{ErrorKind, GeminiClient};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

// Kept alone in this binary: it clears process-wide environment variables.
#[tokio::test]
async fn test_missing_credential_halts_before_any_call() {
    for var in API_KEY_ENV_VARS {
        std::env::remove_var(var);
    }

    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = GeminiClient::builder()
        .base_url(server.uri())
        .build()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingCredential);
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}
