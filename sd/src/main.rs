//! sd - slide background generator
//!
//! CLI entry point for the interactive session and one-shot generation.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tokio::sync::broadcast;
use tracing::{debug, info};

use slidedeck::cli::{Cli, Command, get_log_path};
use slidedeck::config::Config;
use slidedeck::repl;
use slidedeck::session::{Orchestrator, Outcome, Slot, format_tips};
use slidedeck::SessionEvent;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;
    info!(endpoint = %config.export.endpoint, "sd loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Repl) => repl::run_interactive(&config).await,
        Some(Command::Generate {
            text,
            preview,
            export,
            output_dir,
        }) => {
            let output_dir = output_dir.unwrap_or_else(|| config.export.output_dir.clone());
            cmd_generate(&config, &text, preview, export, output_dir).await
        }
    }
}

/// Submit once, then optionally preview and export
async fn cmd_generate(
    config: &Config,
    text: &str,
    preview: Option<Slot>,
    export: bool,
    output_dir: PathBuf,
) -> Result<()> {
    debug!(%text, ?preview, export, "cmd_generate: called");
    let mut orchestrator = Orchestrator::from_config(config)?;
    let printer = tokio::spawn(print_events(orchestrator.events().subscribe()));

    let result = run_pipeline(&mut orchestrator, text, preview, export, output_dir).await;
    drop(orchestrator);
    let _ = printer.await;
    result
}

async fn run_pipeline(
    orchestrator: &mut Orchestrator,
    text: &str,
    preview: Option<Slot>,
    export: bool,
    output_dir: PathBuf,
) -> Result<()> {
    if !orchestrator.submit(text).await.is_completed() {
        return Err(eyre::eyre!("Image generation failed"));
    }
    print_images(orchestrator);

    let Some(slot) = preview else {
        return Ok(());
    };
    if !orchestrator.preview(slot).await.is_completed() {
        return Err(eyre::eyre!("Preview of pattern {} failed", slot));
    }
    print_images(orchestrator);

    if !export {
        return Ok(());
    }
    match orchestrator.export().await {
        Outcome::Completed(download) => {
            let path = download.save_in(&output_dir)?;
            println!("{} Saved {}", "✓".green(), path.display());
            Ok(())
        }
        _ => Err(eyre::eyre!("Export failed")),
    }
}

fn print_images(orchestrator: &Orchestrator) {
    let state = orchestrator.state();
    for slot in Slot::ALL {
        let label = state.slot_labels()[slot.index()];
        if let Some(image) = state.image(slot) {
            println!("{} {}", format!("[{}]", label).bright_cyan(), image);
        }
    }
}

async fn print_events(mut rx: broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = rx.recv().await {
        match event {
            SessionEvent::Warning(warning) => eprintln!("{} {}", "!".yellow().bold(), warning),
            SessionEvent::Tips(tips) => {
                for line in format_tips(&tips) {
                    eprintln!("  {}", line.dimmed());
                }
            }
            SessionEvent::TipsCleared => {}
        }
    }
}
