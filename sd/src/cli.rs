//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::session::Slot;

/// Slide background generator
#[derive(Parser)]
#[command(
    name = "sd",
    about = "Generate PowerPoint slide backgrounds from a design description",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to `repl`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the interactive session
    Repl,

    /// Run one request end to end without prompting
    Generate {
        /// Design description (Japanese or English)
        text: String,

        /// Expand this pattern into title/content/divider slides
        #[arg(short, long, value_name = "A|B|C")]
        preview: Option<Slot>,

        /// Export slides.pptx after the preview (requires --preview)
        #[arg(short, long, requires = "preview")]
        export: bool,

        /// Directory to write slides.pptx into (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Location of the log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("slidedeck")
        .join("logs")
        .join("slidedeck.log")
}
