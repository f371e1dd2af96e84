use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};
use log::info;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use synth_snake::audio::AudioEngine;
use synth_snake::coach::gemini::DEFAULT_MODEL;
use synth_snake::coach::{GeminiCoach, TipSource};
use synth_snake::game::GameConfig;
use synth_snake::modes::HumanMode;
use synth_snake::persistence::HighScoreStore;

#[derive(Parser)]
#[command(name = "synth_snake")]
#[command(version, about = "Snake with a synthesized soundtrack and an AI coach")]
struct Cli {
    /// Cells per side of the square board (at most 200)
    #[arg(long, default_value = "30")]
    grid_size: usize,

    /// JSON file with game settings; overrides --grid-size
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the high score is kept
    #[arg(long, default_value = "snake-high-score.json")]
    high_score_file: PathBuf,

    /// Log destination (the terminal is taken by the game)
    #[arg(long, default_value = "snake.log")]
    log_file: PathBuf,

    /// Start with sound muted
    #[arg(long)]
    mute: bool,

    /// Never ask for strategy tips
    #[arg(long)]
    no_coach: bool,

    /// Model used for strategy tips
    #[arg(long, default_value = DEFAULT_MODEL)]
    gemini_model: String,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_file)?;

    // Create game configuration from CLI arguments
    let config = match &cli.config {
        Some(path) => GameConfig::from_file(path)?,
        None => GameConfig::new(cli.grid_size),
    };
    config.validate().context("Invalid game configuration")?;

    let store = HighScoreStore::new(cli.high_score_file.clone());

    let mut audio = AudioEngine::new();
    if cli.mute {
        audio.set_muted(true);
    }

    let coach: Option<Arc<dyn TipSource>> = if cli.no_coach {
        None
    } else {
        let coach = GeminiCoach::from_env(cli.gemini_model.clone());
        Some(Arc::new(coach) as Arc<dyn TipSource>)
    };

    info!(
        "starting on a {0}x{0} board, coach {1}",
        config.grid_size,
        if coach.is_some() { "on" } else { "off" }
    );

    let mut human_mode = HumanMode::new(config, store, audio, coach)?;
    human_mode.run().await?;

    Ok(())
}
