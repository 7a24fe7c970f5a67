//! Remote generation clients.

mod gemini;
mod provider;

pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use provider::{VibeClient, VibeResponse};
