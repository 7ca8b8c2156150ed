//! Prompt composition for image and advice requests

use eyre::Result;
use tracing::debug;

use super::slot::Slot;
use crate::prompts::{PromptContext, PromptLoader};

/// Base prompt used by preview expansion when the slot has no recorded prompt
pub const DEFAULT_PREVIEW_BASE: &str = "Create a PowerPoint slide background image.";

/// Builds every prompt the session sends to a service
pub struct PromptComposer {
    loader: PromptLoader,
}

impl PromptComposer {
    pub fn new(loader: PromptLoader) -> Self {
        Self { loader }
    }

    /// Compose the image prompt for a submitted request
    ///
    /// A slot reference only refines an existing pattern once all three slots
    /// carry a prompt; otherwise a fresh prompt is built.
    pub fn compose(&self, translated: &str, slot: Option<Slot>, slot_prompts: &[Option<String>; 3]) -> Result<String> {
        let all_present = slot_prompts.iter().all(Option::is_some);
        match (slot, all_present) {
            (Some(slot), true) => {
                let base = slot_prompts[slot.index()].as_deref().unwrap_or_default();
                debug!(%slot, base_len = base.len(), "compose: refining existing pattern");
                self.loader
                    .render("refine", &PromptContext::base_and_text(base, translated))
            }
            _ => {
                debug!(?slot, all_present, "compose: fresh prompt");
                self.loader.render("fresh", &PromptContext::text(translated))
            }
        }
    }

    /// Derive the content-slide and divider-slide prompts from a base prompt
    pub fn preview_prompts(&self, base: Option<&str>) -> Result<(String, String)> {
        let base = base.unwrap_or(DEFAULT_PREVIEW_BASE);
        let content = self.loader.render("preview-content", &PromptContext::base(base))?;
        let divider = self.loader.render("preview-divider", &PromptContext::base(base))?;
        Ok((content, divider))
    }

    /// Advice request for the raw user text
    pub fn advice_prompt(&self, raw_text: &str) -> Result<String> {
        if super::advice::has_purpose_keyword(raw_text) {
            self.loader.render("advice-purpose", &PromptContext::text(raw_text))
        } else {
            self.loader.render("advice-general", &PromptContext::default())
        }
    }
}
