//! Interactive REPL
//!
//! Free text submits a design request; slash commands drive preview, export
//! and inspection.

mod session;

pub use session::ReplSession;

use eyre::Result;

use crate::config::Config;
use crate::session::Orchestrator;

/// Run the interactive REPL
///
/// This is the main entry point for `sd repl`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config)?;
    let mut session = ReplSession::new(orchestrator, config.export.output_dir.clone());
    session.run().await
}
