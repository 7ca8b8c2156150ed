//! Slide-background session
//!
//! Three image slots, the prompts that produced them, and the workflow that
//! turns a free-text request into a title/content/divider triad.

pub mod advice;
mod compose;
mod orchestrator;
mod pattern;
mod slot;
mod state;
mod warning;

pub use advice::{ADVICE_FALLBACK, format_tips, has_purpose_keyword};
pub use compose::{DEFAULT_PREVIEW_BASE, PromptComposer};
pub use orchestrator::{Download, EXPORT_FILE_NAME, Orchestrator};
pub use pattern::{PatternRef, detect};
pub use slot::{ImageRef, Slot, SlotLabel};
pub use state::{Phase, SessionSnapshot, SessionState};
pub use warning::{Outcome, Rejection, Warning};
