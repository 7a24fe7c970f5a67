//! CLI for OMNI-VIBE - image vibe analysis via Gemini.

use clap::{Args, Parser, Subcommand};
use omnivibe::config::{self, Settings};
use omnivibe::{
    GeminiClient, GeminiClientBuilder, ImageFormat, ImageUpload, VibeAnalyzer, VibeClient,
    VibeModel,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "omnivibe")]
#[command(about = "Analyze an image against a target vibe with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to ./omnivibe.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model identifier (overrides settings)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one image and print the response
    Analyze(AnalyzeArgs),

    /// Run the single-page form
    Serve(ServeArgs),

    /// List accepted image formats
    Formats,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to the image (jpg, png or webp)
    image: PathBuf,

    /// Target vibe, e.g. "Industrial Luxury"
    #[arg(short, long)]
    vibe: String,

    /// Action label (defaults to the configured action)
    #[arg(short, long)]
    action: Option<String>,

    /// Check the credential and model before sending the image
    #[arg(long)]
    check: bool,

    /// Timeout for the request in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on (overrides settings)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    config::load_env_file();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(model) = &cli.model {
        settings.model = model.parse::<VibeModel>()?;
    }

    match cli.command {
        Commands::Analyze(args) => analyze(args, settings, cli.json).await?,
        Commands::Serve(args) => serve(args, settings).await?,
        Commands::Formats => list_formats(cli.json)?,
    }

    Ok(())
}

/// Builds the client, failing before any input is read if no key is set.
fn build_client(settings: &Settings, timeout: Option<u64>) -> anyhow::Result<GeminiClient> {
    let mut builder = GeminiClientBuilder::from_settings(settings);
    if let Some(secs) = timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

async fn analyze(args: AnalyzeArgs, settings: Settings, json_output: bool) -> anyhow::Result<()> {
    let client = build_client(&settings, args.timeout)?;
    if args.check {
        client.health_check().await?;
        tracing::info!(model = client.model(), "credential and model verified");
    }

    let image = ImageUpload::from_path(&args.image)?;
    let analyzer = VibeAnalyzer::from_settings(client, &settings);
    let response = analyzer
        .analyze(Some(image), &args.vibe, args.action.as_deref())
        .await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", response.text);
    }

    Ok(())
}

async fn serve(args: ServeArgs, settings: Settings) -> anyhow::Result<()> {
    let client = build_client(&settings, None)?;
    let addr = match args.bind {
        Some(addr) => addr,
        None => settings.bind.parse()?,
    };
    let analyzer = Arc::new(VibeAnalyzer::from_settings(client, &settings));
    omnivibe::form::serve(addr, analyzer).await?;
    Ok(())
}

fn list_formats(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct FormatInfo {
        extension: &'static str,
        mime_type: &'static str,
    }

    if json_output {
        let formats: Vec<FormatInfo> = ImageFormat::ALL
            .iter()
            .map(|f| FormatInfo {
                extension: f.extension(),
                mime_type: f.mime_type(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&formats)?);
    } else {
        println!("Accepted image formats:\n");
        for format in ImageFormat::ALL {
            println!("  .{:<5} {}", format.extension(), format.mime_type());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "omnivibe",
            "analyze",
            "sketsa_anda.jpg",
            "--vibe",
            "Industrial Luxury",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.vibe, "Industrial Luxury");
                assert!(args.action.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_json_flag_defaults_off() {
        let cli = Cli::try_parse_from(["omnivibe", "--json", "formats"]).unwrap();
        assert!(cli.json);

        let cli = Cli::try_parse_from(["omnivibe", "analyze", "a.png", "-v", "Calm"]).unwrap();
        assert!(!cli.json);
    }

    #[test]
    fn test_rejects_output_option() {
        let result = Cli::try_parse_from([
            "omnivibe", "analyze", "a.png", "-v", "Calm", "--output", "json",
        ]);
        assert!(result.is_err());
    }
}
