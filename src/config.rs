//! Model, generation and runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment overrides. Command-line flags are applied last by the binary.

use crate::error::{Result, VibeError};
use crate::preamble::Preamble;
use crate::prompt::{DEFAULT_ACTION, DEFAULT_INSTRUCTION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "omnivibe.toml";

/// Public Gemini API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VibeModel {
    /// Gemini 1.5 Pro.
    #[default]
    Gemini15Pro,
    /// Gemini 1.5 Flash.
    Gemini15Flash,
    /// Gemini 2.5 Pro.
    Gemini25Pro,
    /// Gemini 2.5 Flash.
    Gemini25Flash,
    /// Any other model identifier accepted by the API.
    Custom(String),
}

impl VibeModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gemini15Pro => "gemini-1.5-pro",
            Self::Gemini15Flash => "gemini-1.5-flash",
            Self::Gemini25Pro => "gemini-2.5-pro",
            Self::Gemini25Flash => "gemini-2.5-flash",
            Self::Custom(id) => id,
        }
    }
}

impl FromStr for VibeModel {
    type Err = VibeError;

    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim().trim_start_matches("models/");
        Ok(match id {
            "" => return Err(VibeError::Config("model identifier is empty".into())),
            "gemini-1.5-pro" => Self::Gemini15Pro,
            "gemini-1.5-flash" => Self::Gemini15Flash,
            "gemini-2.5-pro" => Self::Gemini25Pro,
            "gemini-2.5-flash" => Self::Gemini25Flash,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl TryFrom<String> for VibeModel {
    type Error = VibeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VibeModel> for String {
    fn from(model: VibeModel) -> Self {
        model.as_str().to_string()
    }
}

impl std::fmt::Display for VibeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format requested from the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// `text/plain`. Markdown structure is requested through the preamble.
    #[default]
    Text,
    /// `text/markdown`. Not every model accepts this MIME type.
    Markdown,
}

impl ResponseFormat {
    /// Returns the `responseMimeType` value.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Markdown => "text/markdown",
        }
    }
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling probability.
    pub top_p: f32,
    /// Top-k sampling.
    pub top_k: u32,
    /// Maximum output length in tokens.
    pub max_output_tokens: u32,
    /// Requested output format.
    pub response_format: ResponseFormat,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_format: ResponseFormat::Text,
        }
    }
}

impl GenerationConfig {
    /// Checks the parameters against the ranges the API accepts.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(VibeError::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(VibeError::Config(format!(
                "top_p must be within 0.0..=1.0, got {}",
                self.top_p
            )));
        }
        if self.top_k == 0 {
            return Err(VibeError::Config("top_k must be positive".into()));
        }
        if self.max_output_tokens == 0 {
            return Err(VibeError::Config("max_output_tokens must be positive".into()));
        }
        Ok(())
    }
}

/// Everything the surfaces need besides the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Model to call.
    pub model: VibeModel,
    /// Analysis instruction leading the prompt.
    pub instruction: String,
    /// Action label used when a surface does not supply one.
    pub action: String,
    /// API root, overridable for proxies and tests.
    pub base_url: String,
    /// Optional limit on the single remote call.
    pub timeout_secs: Option<u64>,
    /// Listen address of the form runner.
    pub bind: String,
    /// Sampling parameters.
    pub generation: GenerationConfig,
    /// System instruction.
    pub preamble: Preamble,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: VibeModel::default(),
            instruction: DEFAULT_INSTRUCTION.into(),
            action: DEFAULT_ACTION.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: None,
            bind: "127.0.0.1:8501".into(),
            generation: GenerationConfig::default(),
            preamble: Preamble::default(),
        }
    }
}

impl Settings {
    /// Parses settings from TOML text. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(text).map_err(|e| VibeError::Config(e.to_string()))?;
        settings.generation.validate()?;
        Ok(settings)
    }

    /// Loads settings from `path`, or from [`DEFAULT_SETTINGS_FILE`] if present.
    ///
    /// An explicit path must exist; the default file is optional. Environment
    /// overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
                default.exists().then_some(default)
            }
        };

        let mut settings = match file {
            Some(file) => {
                let text = std::fs::read_to_string(&file).map_err(|e| {
                    VibeError::Config(format!("cannot read {}: {e}", file.display()))
                })?;
                tracing::debug!(path = %file.display(), "loaded settings file");
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };

        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Applies `OMNIVIBE_MODEL` and `OMNIVIBE_BASE_URL` from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(model) = lookup("OMNIVIBE_MODEL").filter(|v| !v.trim().is_empty()) {
            self.model = model.parse()?;
        }
        if let Some(url) = lookup("OMNIVIBE_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        Ok(())
    }

    /// Returns the call timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Loads a `.env` file from the working directory or its parents, if any.
///
/// Returns the path that was loaded.
pub fn load_env_file() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded environment file");
            Some(path)
        }
        Err(_) => None,
    }
}

/// Resolves the API key from an explicit value or the process environment.
pub fn resolve_api_key(explicit: Option<String>) -> Result<String> {
    resolve_api_key_with(explicit, |key| std::env::var(key).ok())
}

/// Resolves the API key, looking variables up through `lookup`.
///
/// Blank values count as absent.
pub fn resolve_api_key_with(
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    explicit
        .into_iter()
        .chain(API_KEY_ENV_VARS.iter().filter_map(|var| lookup(var)))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or_else(|| {
            VibeError::MissingCredential(format!(
                "set {} (or {}) or provide an API key",
                API_KEY_ENV_VARS[0], API_KEY_ENV_VARS[1]
            ))
        })
}
