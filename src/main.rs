use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber;

use reelstitch::{composition::AssemblyEngine, config::Config};

#[derive(Parser)]
#[command(
    name = "reelstitch",
    version,
    about = "Assemble narrated videos from mismatched stock clips",
    long_about = "Reelstitch takes any set of video clips plus one narration track and produces a single video whose length exactly matches the audio, looping, trimming and padding the clips as needed."
)]
struct Cli {
    /// Narration audio file (WAV, MP3, FLAC)
    #[arg(short, long)]
    audio: PathBuf,

    /// Output video file path
    #[arg(short, long)]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Video clips, in playback order (a placeholder background is
    /// generated when none are usable)
    clips: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Reelstitch v{}", env!("CARGO_PKG_VERSION"));
    info!("Audio: {:?}", cli.audio);
    info!("Clips: {}", cli.clips.len());
    info!("Output: {:?}", cli.output);

    // Load configuration
    let config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    config.validate()?;

    // Create and run the assembly engine
    let engine = AssemblyEngine::new(config);

    let report = engine.assemble(&cli.clips, &cli.audio, &cli.output).await?;

    info!(
        "Assembly complete! {:?} ({:.1}s, {:.1} MB, {} segments{})",
        report.output_path,
        report.duration_secs,
        report.file_size as f64 / 1024.0 / 1024.0,
        report.segment_count,
        if report.used_fallback { ", fallback background" } else { "" }
    );
    Ok(())
}
