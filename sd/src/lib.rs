//! slidedeck - slide background generation sessions
//!
//! Turns a free-text design request into three candidate background images,
//! expands a chosen candidate into title/content/divider slides, and exports
//! them as a `.pptx` deck.
//!
//! # Modules
//!
//! - [`session`] - Session state, prompt composition and the workflow orchestrator
//! - [`services`] - Translation, image, advice and export service clients
//! - [`prompts`] - Handlebars prompt templates with embedded defaults
//! - [`events`] - Warning and tips broadcast
//! - [`config`] - Configuration types and loading
//! - [`cli`] / [`repl`] - Terminal front end

pub mod cli;
pub mod config;
pub mod events;
pub mod prompts;
pub mod repl;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use events::{EventBus, SessionEvent};
pub use services::{AdviceGenerator, Exporter, ImageGenerator, ServiceError, Services, Translator, create_services};
pub use session::{
    Download, ImageRef, Orchestrator, Outcome, Phase, PromptComposer, Rejection, SessionSnapshot, SessionState, Slot,
    SlotLabel, Warning,
};
