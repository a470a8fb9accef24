use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a plain-language command into an edit instruction
    Interpret {
        /// Editing command, e.g. "trim the first 10 seconds"
        #[arg(long)]
        command: String,

        /// Video metadata as a JSON object, e.g. '{"duration": 60}'
        #[arg(short, long, default_value = "{}")]
        metadata: String,
    },

    /// Apply an edit instruction to a video file
    Apply {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Instruction JSON, e.g. '{"operation":"trim","parameters":{"start_time":0,"end_time":10}}'
        #[arg(long)]
        instructions: String,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Interpret a command and apply it to a video file
    Edit {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Editing command
        #[arg(long)]
        command: String,

        /// Video metadata as a JSON object
        #[arg(short, long, default_value = "{}")]
        metadata: String,

        /// Output video file (defaults to edited_<name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search and download stock footage
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },

    /// Show media engine and language model status
    Info,

    /// Write the default configuration file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum StockAction {
    /// Search configured providers for footage
    Search {
        /// Search terms
        #[arg(short, long)]
        query: String,
    },

    /// Download footage by URL
    Fetch {
        /// Footage URL
        #[arg(short, long)]
        url: String,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },
}
