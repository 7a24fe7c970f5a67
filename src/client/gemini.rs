//! Gemini `generateContent` client.

use crate::client::provider::{VibeClient, VibeResponse};
use crate::config::{self, GenerationConfig, Settings, VibeModel, DEFAULT_BASE_URL};
use crate::error::{parse_retry_after, sanitize_error_message, Result, VibeError};
use crate::image::ImageUpload;
use crate::preamble::Preamble;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: VibeModel,
    generation: GenerationConfig,
    preamble: Preamble,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: None,
            model: settings.model.clone(),
            generation: settings.generation.clone(),
            preamble: settings.preamble.clone(),
            base_url: Some(settings.base_url.clone()),
            timeout: settings.timeout(),
        }
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model.
    pub fn model(mut self, model: VibeModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the sampling parameters.
    pub fn generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Sets the behavioral preamble.
    pub fn preamble(mut self, preamble: Preamble) -> Self {
        self.preamble = preamble;
        self
    }

    /// Overrides the API root (e.g. a proxy or a local mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Limits how long the single call may take.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = config::resolve_api_key(self.api_key)?;
        self.generation.validate()?;

        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiClient {
            http: http.build()?,
            api_key,
            model: self.model,
            generation: self.generation,
            system_instruction: self.preamble.render(),
            base_url,
            timeout: self.timeout,
        })
    }
}

/// Client for the Gemini API.
///
/// Constructed once and shared read-only; holds no per-request state.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: VibeModel,
    generation: GenerationConfig,
    system_instruction: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    /// Returns the rendered system instruction.
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model.as_str())
    }

    fn map_send_error(&self, err: reqwest::Error) -> VibeError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => VibeError::Timeout(timeout),
            _ => VibeError::Network(err),
        }
    }

    async fn generate_impl(&self, prompt: &str, image: &ImageUpload) -> Result<VibeResponse> {
        if prompt.trim().is_empty() {
            return Err(VibeError::InvalidRequest("prompt text is empty".into()));
        }

        let start = Instant::now();
        let url = format!("{}:generateContent", self.model_url());
        let body = GeminiRequest::new(
            &self.system_instruction,
            prompt,
            image,
            &self.generation,
        );

        tracing::debug!(
            model = %self.model,
            mime_type = image.mime_type(),
            image_bytes = image.size(),
            "submitting generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let (text, finish_reason) = parse_response(&body)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(model = %self.model, duration_ms, "generateContent complete");

        Ok(VibeResponse {
            text,
            model: Some(self.model.as_str().to_string()),
            finish_reason,
            duration_ms: Some(duration_ms),
        })
    }
}

/// Parses a 2xx body. A body that is not Gemini JSON is a remote failure.
fn parse_response(body: &str) -> Result<(String, Option<String>)> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| VibeError::UnexpectedResponse(format!("invalid Gemini response: {e}")))?;
    response.into_text()
}

/// Maps a non-2xx response to an error, keeping the service's message.
fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> VibeError {
    let message = serde_json::from_str::<GeminiErrorBody>(text)
        .ok()
        .and_then(|body| body.error.message)
        .unwrap_or_else(|| text.trim().to_string());
    let message = sanitize_error_message(&message);

    match status {
        401 | 403 => VibeError::Auth(message),
        429 => {
            let retry_after = parse_retry_after(headers).map(Duration::from_secs);
            VibeError::RateLimited {
                message,
                retry_after,
            }
        }
        404 => VibeError::Api {
            status,
            message: format!("model not found: {message}"),
        },
        _ => VibeError::Api { status, message },
    }
}

#[async_trait]
impl VibeClient for GeminiClient {
    async fn generate(&self, prompt: &str, image: &ImageUpload) -> Result<VibeResponse> {
        self.generate_impl(prompt, image).await
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .http
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        Err(parse_error(status.as_u16(), &text, &headers))
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

impl GeminiRequest {
    fn new(
        system_instruction: &str,
        prompt: &str,
        image: &ImageUpload,
        generation: &GenerationConfig,
    ) -> Self {
        Self {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiRequestPart::Text {
                    text: system_instruction.to_string(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![
                    GeminiRequestPart::Text {
                        text: prompt.to_string(),
                    },
                    GeminiRequestPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: image.mime_type().to_string(),
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: generation.temperature,
                top_p: generation.top_p,
                top_k: generation.top_k,
                max_output_tokens: generation.max_output_tokens,
                response_mime_type: generation.response_format.mime_type(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl GeminiResponse {
    /// Extracts the first candidate's text, untouched.
    fn into_text(self) -> Result<(String, Option<String>)> {
        // Blocked prompts come back as HTTP 200 with prompt feedback
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .unwrap_or_else(|| format!("prompt blocked: {reason}"));
                return Err(VibeError::ContentBlocked(msg));
            }
        }

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            VibeError::UnexpectedResponse("no candidates in Gemini response".into())
        })?;

        if let Some(ref reason) = candidate.finish_reason {
            if matches!(
                reason.as_str(),
                "SAFETY" | "RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII"
            ) {
                return Err(VibeError::ContentBlocked(format!(
                    "response blocked by Gemini safety filter: {reason}"
                )));
            }
        }

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        let mut text = String::new();
        let mut found = false;
        for part in parts.into_iter().filter(|p| !p.thought) {
            if let Some(t) = part.text {
                text.push_str(&t);
                found = true;
            }
        }

        if !found {
            return Err(VibeError::UnexpectedResponse(format!(
                "no text in Gemini response (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok((text, candidate.finish_reason))
    }
}
