//! Session state and workflow phases
//!
//! The four permission flags are not stored; they are derived from the
//! current [`Phase`], so combinations like "preview enabled while loading"
//! cannot be represented.

use serde::Serialize;
use tracing::info;

use super::slot::{ImageRef, Slot, SlotLabel};

/// Where the workflow currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Nothing in flight; only submit is possible
    Idle,
    /// Advice request issued alongside the main flow
    Advising,
    /// Translating the user's request
    Translating,
    /// Building the image prompt
    Composing,
    /// Waiting on the three-image generation
    GeneratingInitial,
    /// Three fresh images are held; one may be expanded
    PreviewReady,
    /// Waiting on the content and divider images
    ExpandingPreview,
    /// Title/content/divider triad is held; export is possible
    ExportReady,
    /// Waiting on the exporter
    Exporting,
}

impl Phase {
    /// An image round-trip (or the steps leading up to one) is outstanding
    pub fn is_loading(self) -> bool {
        matches!(
            self,
            Self::Advising | Self::Translating | Self::Composing | Self::GeneratingInitial | Self::ExpandingPreview
        )
    }

    pub fn is_exporting(self) -> bool {
        self == Self::Exporting
    }

    pub fn preview_enabled(self) -> bool {
        self == Self::PreviewReady
    }

    pub fn export_enabled(self) -> bool {
        self == Self::ExportReady
    }
}

/// Mutable session model, owned by the orchestrator
#[derive(Debug, Clone)]
pub struct SessionState {
    images: [Option<ImageRef>; 3],
    slot_prompts: [Option<String>; 3],
    slot_labels: [SlotLabel; 3],
    phase: Phase,
    tips: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Empty session: no images, no prompts, generic labels
    pub fn new() -> Self {
        Self {
            images: Default::default(),
            slot_prompts: Default::default(),
            slot_labels: SlotLabel::patterns(),
            phase: Phase::Idle,
            tips: None,
        }
    }

    pub fn images(&self) -> &[Option<ImageRef>; 3] {
        &self.images
    }

    pub fn image(&self, slot: Slot) -> Option<&ImageRef> {
        self.images[slot.index()].as_ref()
    }

    pub fn slot_prompts(&self) -> &[Option<String>; 3] {
        &self.slot_prompts
    }

    pub fn slot_prompt(&self, slot: Slot) -> Option<&str> {
        self.slot_prompts[slot.index()].as_deref()
    }

    pub fn slot_labels(&self) -> &[SlotLabel; 3] {
        &self.slot_labels
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tips(&self) -> Option<&str> {
        self.tips.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.phase.is_loading()
    }

    pub fn exporting(&self) -> bool {
        self.phase.is_exporting()
    }

    pub fn preview_enabled(&self) -> bool {
        self.phase.preview_enabled()
    }

    pub fn export_enabled(&self) -> bool {
        self.phase.export_enabled()
    }

    /// All three slots hold a non-empty image
    pub fn is_complete(&self) -> bool {
        self.images.iter().all(|img| img.as_ref().is_some_and(|i| !i.is_empty()))
    }

    /// The three images in slot order, once all are present
    pub fn image_triad(&self) -> Option<[ImageRef; 3]> {
        match &self.images {
            [Some(a), Some(b), Some(c)] => Some([a.clone(), b.clone(), c.clone()]),
            _ => None,
        }
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            info!(from = ?self.phase, to = ?phase, "session phase changed");
            self.phase = phase;
        }
    }

    pub(crate) fn set_tips(&mut self, tips: Option<String>) {
        self.tips = tips;
    }

    /// Apply a successful initial generation
    pub(crate) fn apply_generation(&mut self, images: [ImageRef; 3], prompt: String) {
        self.images = images.map(Some);
        self.slot_prompts = [Some(prompt.clone()), Some(prompt.clone()), Some(prompt)];
        self.slot_labels = SlotLabel::patterns();
    }

    /// Apply a successful preview expansion in one step
    pub(crate) fn apply_preview(&mut self, title: ImageRef, content: ImageRef, divider: ImageRef) {
        self.images = [Some(title), Some(content), Some(divider)];
        self.slot_labels = SlotLabel::semantic();
    }

    /// Point-in-time copy for presentation code
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            images: self.images.clone(),
            slot_prompts: self.slot_prompts.clone(),
            slot_labels: self.slot_labels,
            phase: self.phase,
            loading: self.loading(),
            exporting: self.exporting(),
            preview_enabled: self.preview_enabled(),
            export_enabled: self.export_enabled(),
            tips: self.tips.clone(),
        }
    }
}

/// Read-only view of the session published after every change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub images: [Option<ImageRef>; 3],
    pub slot_prompts: [Option<String>; 3],
    pub slot_labels: [SlotLabel; 3],
    pub phase: Phase,
    pub loading: bool,
    pub exporting: bool,
    pub preview_enabled: bool,
    pub export_enabled: bool,
    pub tips: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SessionState::new().snapshot()
    }
}
