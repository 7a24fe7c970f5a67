//! Remote generation client trait.

use crate::error::Result;
use crate::image::ImageUpload;
use async_trait::async_trait;
use serde::Serialize;

/// Text produced by the remote model for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use = "the response text should be displayed"]
pub struct VibeResponse {
    /// Generated text, exactly as returned by the service.
    pub text: String,
    /// Model that produced the text.
    pub model: Option<String>,
    /// Why generation stopped, if reported.
    pub finish_reason: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
}

impl VibeResponse {
    /// Creates a response carrying only text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            finish_reason: None,
            duration_ms: None,
        }
    }
}

/// A client that sends one prompt plus one image and returns generated text.
#[async_trait]
pub trait VibeClient: Send + Sync {
    /// Sends a single request and returns the model's text.
    ///
    /// Issues exactly one outbound call. Failures are returned as-is, there is
    /// no retry.
    async fn generate(&self, prompt: &str, image: &ImageUpload) -> Result<VibeResponse>;

    /// Returns the model identifier used for requests.
    fn model(&self) -> &str;

    /// Checks that the service is reachable and the credential is accepted.
    ///
    /// Must contact the service and fail when the credential or model is
    /// rejected.
    async fn health_check(&self) -> Result<()>;
}

#[async_trait]
impl<T: VibeClient + ?Sized> VibeClient for std::sync::Arc<T> {
    async fn generate(&self, prompt: &str, image: &ImageUpload) -> Result<VibeResponse> {
        (**self).generate(prompt, image).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn health_check(&self) -> Result<()> {
        (**self).health_check().await
    }
}
