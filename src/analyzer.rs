//! One analysis run: validate inputs, compose the prompt, call the client.

use crate::client::{VibeClient, VibeResponse};
use crate::config::Settings;
use crate::error::{Result, VibeError};
use crate::image::ImageUpload;
use crate::prompt::PromptComposer;

/// Drives a single request through a [`VibeClient`].
///
/// Holds nothing between runs, so a failed run leaves it ready for the next.
#[derive(Debug, Clone)]
pub struct VibeAnalyzer<C> {
    client: C,
    composer: PromptComposer,
    default_action: String,
}

impl<C: VibeClient> VibeAnalyzer<C> {
    /// Creates an analyzer with the default instruction and action.
    pub fn new(client: C) -> Self {
        Self::with_composer(client, PromptComposer::default())
    }

    /// Creates an analyzer with a custom prompt composer.
    pub fn with_composer(client: C, composer: PromptComposer) -> Self {
        Self {
            client,
            composer,
            default_action: crate::prompt::DEFAULT_ACTION.to_string(),
        }
    }

    /// Creates an analyzer using the instruction and action from `settings`.
    pub fn from_settings(client: C, settings: &Settings) -> Self {
        Self {
            client,
            composer: PromptComposer::new(settings.instruction.clone()),
            default_action: settings.action.clone(),
        }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the prompt composer.
    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    /// Returns the action label used when a surface supplies none.
    pub fn default_action(&self) -> &str {
        &self.default_action
    }

    /// Runs one analysis.
    ///
    /// A missing or empty image, or a blank target vibe, fails with
    /// [`VibeError::MissingInput`] before anything is sent. The image is
    /// consumed and dropped once the call returns.
    pub async fn analyze(
        &self,
        image: Option<ImageUpload>,
        target_vibe: &str,
        action: Option<&str>,
    ) -> Result<VibeResponse> {
        let image = image
            .filter(|img| !img.is_empty())
            .ok_or_else(|| VibeError::MissingInput("please upload an image first".into()))?;

        if target_vibe.trim().is_empty() {
            return Err(VibeError::MissingInput(
                "please describe the target vibe".into(),
            ));
        }

        let action = action
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(self.default_action.as_str());
        let prompt = self.composer.compose(target_vibe, action);

        tracing::debug!(model = self.client.model(), %prompt, "running vibe analysis");
        self.client.generate(&prompt, &image).await
    }
}
