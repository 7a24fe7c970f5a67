//! Error types for vibe analysis.

use std::time::Duration;

/// Coarse classification of a [`VibeError`], as seen by an entry surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No API credential was available at startup. Fatal.
    MissingCredential,
    /// The user did not supply an image or a target vibe. No call was made.
    MissingInput,
    /// The remote generation call failed (network, auth, quota, rejection).
    RemoteCallFailure,
    /// A local failure unrelated to the remote service (I/O, config, arguments).
    Local,
}

/// Errors that can occur while analyzing an image.
#[derive(Debug, thiserror::Error)]
pub enum VibeError {
    /// No API key was configured.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// A required input (image or target vibe) was not supplied.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Invalid request parameters, rejected before any call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API key rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message reported by the service.
        message: String,
    },

    /// Quota or rate limit exceeded.
    #[error("rate limited: {message}")]
    RateLimited {
        /// Message reported by the service.
        message: String,
        /// Suggested wait from the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The prompt or the output was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The service answered, but not with any text.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (e.g., reading the image file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl VibeError {
    /// Classifies this error for display by an entry surface.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential(_) => ErrorKind::MissingCredential,
            Self::MissingInput(_) => ErrorKind::MissingInput,
            Self::Auth(_)
            | Self::Api { .. }
            | Self::RateLimited { .. }
            | Self::Timeout(_)
            | Self::ContentBlocked(_)
            | Self::UnexpectedResponse(_)
            | Self::Network(_) => ErrorKind::RemoteCallFailure,
            Self::InvalidRequest(_) | Self::Io(_) | Self::Json(_) | Self::Config(_) => {
                ErrorKind::Local
            }
        }
    }

    /// Returns true if this error came from the remote call.
    pub fn is_remote_failure(&self) -> bool {
        self.kind() == ErrorKind::RemoteCallFailure
    }
}

/// Redacts anything that looks like an API key from a service error body.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if word.starts_with("AIza") && word.len() >= 30 {
            out.push_str("[REDACTED]");
        } else {
            out.push_str(word);
        }
    }
    out
}

/// Parses a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Result type alias for vibe analysis operations.
pub type Result<T> = std::result::Result<T, VibeError>;
