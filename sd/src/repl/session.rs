//! REPL session management

use std::path::PathBuf;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::events::SessionEvent;
use crate::session::{Orchestrator, Outcome, Rejection, SessionSnapshot, Slot, format_tips};

/// Interactive slide-background session
pub struct ReplSession {
    orchestrator: Orchestrator,
    output_dir: PathBuf,
    printer: JoinHandle<()>,
}

impl ReplSession {
    /// Create a new REPL session
    ///
    /// Must be called inside a tokio runtime; warnings and tips are printed
    /// by a background task as they arrive.
    pub fn new(orchestrator: Orchestrator, output_dir: PathBuf) -> Self {
        let printer = tokio::spawn(print_events(orchestrator.events().subscribe()));
        Self {
            orchestrator,
            output_dir,
            printer,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.submit(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Slide Background Generator".bright_cyan().bold());
        println!("Describe a design to generate three patterns (A, B, C).");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn submit(&mut self, text: &str) {
        println!("{}", "Generating images...".dimmed());
        match self.orchestrator.submit(text).await {
            Outcome::Completed(()) => {
                print_slots(&self.orchestrator.state().snapshot());
                println!(
                    "Pick one with {} to build title/content/divider slides",
                    "/preview <a|b|c>".yellow()
                );
            }
            Outcome::Failed(_) => {}
            Outcome::Rejected(reason) => print_rejection(reason),
        }
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        match SlashCommand::parse(input) {
            SlashCommand::Help => {
                self.print_help();
                SlashResult::Continue
            }
            SlashCommand::Quit => SlashResult::Quit,
            SlashCommand::State => {
                print_state(&self.orchestrator.state().snapshot());
                SlashResult::Continue
            }
            SlashCommand::Preview(Some(slot)) => {
                self.preview(slot).await;
                SlashResult::Continue
            }
            SlashCommand::Preview(None) => {
                println!("{} Usage: /preview <a|b|c|1-3>", "?".yellow());
                SlashResult::Continue
            }
            SlashCommand::Export => {
                self.export().await;
                SlashResult::Continue
            }
            SlashCommand::Unknown(cmd) => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    async fn preview(&mut self, slot: Slot) {
        let snapshot = self.orchestrator.state().snapshot();
        // An empty slot falls through so the session raises its own warning
        if snapshot.images[slot.index()].is_some() && !snapshot.preview_enabled {
            print_rejection(Rejection::PreviewUnavailable);
            return;
        }

        println!("{}", format!("Expanding pattern {}...", slot).dimmed());
        match self.orchestrator.preview(slot).await {
            Outcome::Completed(()) => {
                print_slots(&self.orchestrator.state().snapshot());
                println!("Download the deck with {}", "/export".yellow());
            }
            Outcome::Failed(_) => {}
            Outcome::Rejected(Rejection::EmptySlot) => {}
            Outcome::Rejected(reason) => print_rejection(reason),
        }
    }

    async fn export(&mut self) {
        let snapshot = self.orchestrator.state().snapshot();
        if !snapshot.export_enabled {
            print_rejection(Rejection::ExportUnavailable);
            return;
        }

        println!("{}", "Exporting slides...".dimmed());
        match self.orchestrator.export().await {
            Outcome::Completed(download) => match download.save_in(&self.output_dir) {
                Ok(path) => println!("{} Saved {}", "✓".green(), path.display()),
                Err(e) => println!("{} {:#}", "✗".red(), e),
            },
            Outcome::Failed(_) => {}
            Outcome::Rejected(reason) => print_rejection(reason),
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:18} Generate three patterns from a description", "<text>".yellow());
        println!("  {:18} Expand a pattern into title/content/divider", "/preview <a|b|c>".yellow());
        println!("  {:18} Save slides.pptx to {}", "/export".yellow(), self.output_dir.display());
        println!("  {:18} Show slots, prompts and flags", "/state".yellow());
        println!("  {:18} Show this help", "/help".yellow());
        println!("  {:18} Exit the REPL", "/quit".yellow());
        println!();
        println!("Mention {} in your text to refine that pattern's prompt.", "Bパターン".yellow());
        println!();
    }
}

impl Drop for ReplSession {
    fn drop(&mut self) {
        self.printer.abort();
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

/// A parsed `/command`
#[derive(Debug, PartialEq, Eq)]
enum SlashCommand {
    Help,
    Quit,
    State,
    Preview(Option<Slot>),
    Export,
    Unknown(String),
}

impl SlashCommand {
    fn parse(input: &str) -> Self {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");
        debug!(cmd, "SlashCommand::parse");

        match cmd {
            "/help" | "/h" => Self::Help,
            "/quit" | "/q" | "/exit" => Self::Quit,
            "/state" | "/s" => Self::State,
            "/preview" | "/p" => Self::Preview(parts.get(1).and_then(|arg| arg.parse().ok())),
            "/export" | "/e" => Self::Export,
            other => Self::Unknown(other.to_string()),
        }
    }
}

async fn print_events(mut rx: broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.recv().await {
            Ok(SessionEvent::Warning(warning)) => println!("{} {}", "!".yellow().bold(), warning.to_string().yellow()),
            Ok(SessionEvent::Tips(tips)) => {
                println!("{}", "Tips:".bright_blue());
                for line in format_tips(&tips) {
                    println!("  {}", line.dimmed());
                }
            }
            Ok(SessionEvent::TipsCleared) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => debug!(n, "print_events: lagged"),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_rejection(reason: Rejection) {
    println!("{} {}", "-".yellow(), reason.to_string().dimmed());
}

fn print_slots(snapshot: &SessionSnapshot) {
    println!();
    for slot in Slot::ALL {
        let label = snapshot.slot_labels[slot.index()];
        match &snapshot.images[slot.index()] {
            Some(image) => println!("  {} {}", format!("[{}]", label).bright_cyan(), image),
            None => println!("  {} {}", format!("[{}]", label).bright_cyan(), "(empty)".dimmed()),
        }
    }
    println!();
}

fn print_state(snapshot: &SessionSnapshot) {
    print_slots(snapshot);
    for slot in Slot::ALL {
        if let Some(prompt) = &snapshot.slot_prompts[slot.index()] {
            let preview: String = prompt.chars().take(80).collect();
            let ellipsis = if prompt.chars().count() > 80 { "..." } else { "" };
            println!("  {} {}{}", format!("{}:", slot).yellow(), preview, ellipsis);
        }
    }
    println!(
        "  phase={:?} preview={} export={}",
        snapshot.phase, snapshot.preview_enabled, snapshot.export_enabled
    );
    println!();
}
