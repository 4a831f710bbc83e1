// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use partscout::config::ResearchConfig;
use partscout::research::types::{ImageAttachment, ResearchMode, ResearchRequest};
use partscout::research::{ResearchEngine, ResearchOutcome};

/// Resolve an electronic component from a description and/or a photo
#[derive(Parser, Debug)]
#[command(name = "partscout", version, about)]
struct Cli {
    /// Free-text description of the part
    description: Option<String>,

    /// Path to a photo of the part
    #[arg(long)]
    image: Option<std::path::PathBuf>,

    /// Research depth: quick or research
    #[arg(long, default_value = "research")]
    mode: String,

    /// Extra context hint (repeatable)
    #[arg(long = "hint")]
    hints: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = ResearchConfig::from_env();

    let image = match &cli.image {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            Some(ImageAttachment {
                file_name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
                media_type: None,
                bytes,
            })
        }
        None => None,
    };

    if cli.description.is_none() && image.is_none() {
        anyhow::bail!("Provide a description, an --image, or both");
    }
    if !config.any_provider_configured() {
        warn!("No provider credentials configured; expect a heuristic stub");
    }

    let mode = match cli.mode.as_str() {
        "quick" => ResearchMode::Quick,
        _ => ResearchMode::Research,
    };

    info!("Starting PartScout research (mode: {})", cli.mode);

    let engine = ResearchEngine::new(&config);
    let request = ResearchRequest {
        description: cli.description.clone(),
        image,
        mode,
        hints: cli.hints.clone(),
    };

    let outcome = engine.research(request).await;
    if let ResearchOutcome::Degraded { error, .. } = &outcome {
        warn!("Degraded result: {}", error);
    }

    println!("{}", serde_json::to_string_pretty(outcome.result())?);
    Ok(())
}
