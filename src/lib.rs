#![warn(missing_docs)]
//! OMNI-VIBE - analyze an image against a target vibe with Gemini.
//!
//! One request per run: the target vibe and an action label are composed
//! into a prompt, sent together with the image and a fixed behavioral
//! preamble, and the model's text comes back verbatim.
//!
//! # Quick Start
//!
//! ```no_run
//! use omnivibe::{GeminiClient, ImageUpload, VibeAnalyzer};
//!
//! #[tokio::main]
//! async fn main() -> omnivibe::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let analyzer = VibeAnalyzer::new(client);
//!     let image = ImageUpload::from_path("sketch.jpg")?;
//!     let response = analyzer
//!         .analyze(Some(image), "Industrial Luxury", Some("Analyze Vibe"))
//!         .await?;
//!     println!("{}", response.text);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `form`: single-page form runner (axum)
//! - `cli`: the `omnivibe` command-line binary

pub mod analyzer;
pub mod client;
pub mod config;
mod error;
pub mod image;
pub mod preamble;
pub mod prompt;

#[cfg(feature = "form")]
pub mod form;

// Re-export error types at crate root
pub use error::{ErrorKind, Result, VibeError};

pub use analyzer::VibeAnalyzer;
pub use client::{GeminiClient, GeminiClientBuilder, VibeClient, VibeResponse};
pub use config::{GenerationConfig, ResponseFormat, Settings, VibeModel};
pub use image::{ImageFormat, ImageUpload};
pub use preamble::Preamble;
pub use prompt::PromptComposer;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::analyzer::VibeAnalyzer;
    pub use crate::client::{GeminiClient, VibeClient, VibeResponse};
    pub use crate::error::{ErrorKind, Result, VibeError};
    pub use crate::image::ImageUpload;
}
