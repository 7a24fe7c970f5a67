//! Analyze a local sketch against a fixed target vibe.
//!
//! Run with: `cargo run --example analyze_sketch`
//!
//! Requires `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) and `sketsa_anda.jpg` in
//! the working directory.

use omnivibe::{GeminiClient, ImageUpload, VibeAnalyzer};

#[tokio::main]
async fn main() -> omnivibe::Result<()> {
    omnivibe::config::load_env_file();

    let client = GeminiClient::builder().build()?;
    let analyzer = VibeAnalyzer::new(client);

    let image = ImageUpload::from_path("sketsa_anda.jpg")?;
    let response = analyzer
        .analyze(Some(image), "Industrial Luxury", Some("Analyze Vibe"))
        .await?;

    println!("{}", response.text);
    Ok(())
}
