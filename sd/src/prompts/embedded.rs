//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Fresh background request built around the user's design idea
pub const FRESH: &str = include_str!("../../prompts/fresh.pmt");

/// Refinement of an existing pattern's prompt
pub const REFINE: &str = include_str!("../../prompts/refine.pmt");

/// Content-slide variant used by preview expansion
pub const PREVIEW_CONTENT: &str = include_str!("../../prompts/preview-content.pmt");

/// Section-divider variant used by preview expansion
pub const PREVIEW_DIVIDER: &str = include_str!("../../prompts/preview-divider.pmt");

/// Advice request when the user names a purpose ("営業用")
pub const ADVICE_PURPOSE: &str = include_str!("../../prompts/advice-purpose.pmt");

/// Generic advice request
pub const ADVICE_GENERAL: &str = include_str!("../../prompts/advice-general.pmt");

/// System prompt for the translator
pub const TRANSLATE: &str = include_str!("../../prompts/translate.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "fresh" => Some(FRESH),
        "refine" => Some(REFINE),
        "preview-content" => Some(PREVIEW_CONTENT),
        "preview-divider" => Some(PREVIEW_DIVIDER),
        "advice-purpose" => Some(ADVICE_PURPOSE),
        "advice-general" => Some(ADVICE_GENERAL),
        "translate" => Some(TRANSLATE),
        _ => None,
    };
    if found.is_none() {
        debug!("get_embedded: no match found");
    }
    found
}
