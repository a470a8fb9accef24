//! Reelcraft - Natural-Language Video Editing
//!
//! Command-line entry point: interprets editing commands, applies them to
//! video files and looks up stock footage.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use reelcraft::cli::{Args, Commands, StockAction};
use reelcraft::config::Config;
use reelcraft::error::ReelError;
use reelcraft::instruction::{Instruction, VideoMetadata};
use reelcraft::interpret::Interpreter;
use reelcraft::pipeline::Pipeline;
use reelcraft::stock::StockLocator;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    info!("Starting Reelcraft - Natural-Language Video Editing");

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    }
    .with_env_overrides();

    match args.command {
        Commands::Interpret { command, metadata } => {
            let metadata = parse_metadata(&metadata)?;
            let interpreter = Interpreter::new(config.interpreter);

            let instruction = interpreter.interpret(&command, &metadata).await;
            println!("{}", instruction.to_json()?);
        }
        Commands::Apply { input, instructions, output } => {
            let instruction = Instruction::from_json(&instructions)
                .map_err(|e| ReelError::Config(format!("Invalid instruction JSON: {}", e)))?;
            let pipeline = Pipeline::new(config).await;

            let video = pipeline.apply(&input, &instruction).await?;
            let edited = video.was_edited();
            let saved = video.persist(&output).await?;
            report(saved.as_path(), edited);
        }
        Commands::Edit { input, command, metadata, output } => {
            let metadata = parse_metadata(&metadata)?;
            let pipeline = Pipeline::new(config).await;

            let outcome = pipeline.edit(&input, &command, &metadata).await?;
            let output = match output {
                Some(path) => path,
                None => default_output_path(&input)?,
            };

            println!("Instruction: {}", outcome.instruction.to_json()?);
            println!("{}", outcome.status_message());
            let saved = outcome.video.persist(&output).await?;
            println!("Saved to {}", saved.display());
        }
        Commands::Stock { action } => {
            let locator = StockLocator::from_config(&config.stock)?.with_progress(true);

            match action {
                StockAction::Search { query } => {
                    if locator.provider_count() == 0 {
                        println!("No stock footage providers configured (set PIXABAY_API_KEY or PEXELS_API_KEY).");
                    }
                    let clips = locator.search(&query).await;
                    println!("{}", serde_json::to_string_pretty(&clips)?);
                }
                StockAction::Fetch { url, output } => match locator.fetch(&url).await {
                    Some(path) => {
                        tokio::fs::copy(&path, &output)
                            .await
                            .with_context(|| format!("Failed to write {}", output.display()))?;
                        println!("Saved to {}", output.display());
                    }
                    None => println!("Could not download {}, skipping", url),
                },
            }
        }
        Commands::Info => {
            let pipeline = Pipeline::new(config).await;
            println!("Media engine: {}", pipeline.capability());
            println!(
                "AI interpretation: {}",
                if pipeline.is_ai_enabled() { "enabled" } else { "disabled (keyword rules)" }
            );
        }
        Commands::InitConfig { path } => {
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    info!("Reelcraft completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".reelcraft").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "reelcraft.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("reelcraft.log").display());

    Ok(())
}

fn parse_metadata(json: &str) -> Result<VideoMetadata> {
    VideoMetadata::from_json(json).context("Metadata must be a JSON object")
}

/// `edited_<name>` next to the input
fn default_output_path(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .ok_or_else(|| ReelError::Config("Cannot determine input file name".to_string()))?
        .to_string_lossy();
    Ok(input.with_file_name(format!("edited_{}", name)))
}

fn report(path: &Path, edited: bool) {
    if edited {
        println!("Saved edited video to {}", path.display());
    } else {
        println!("Edit could not be applied; saved a copy of the original to {}", path.display());
    }
}
