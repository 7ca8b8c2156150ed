//! Workflow orchestrator
//!
//! Sequences translate → compose → generate for a submitted request, the
//! two-image preview expansion, and export. Every action returns an
//! [`Outcome`]; failures are reported as warnings on the event bus and never
//! escape as errors.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Context, Result};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{debug, info, warn};

use super::advice::ADVICE_FALLBACK;
use super::compose::PromptComposer;
use super::pattern;
use super::slot::{ImageRef, Slot};
use super::state::{Phase, SessionSnapshot, SessionState};
use super::warning::{Outcome, Rejection, Warning};
use crate::config::Config;
use crate::events::{EventBus, SessionEvent};
use crate::prompts::PromptLoader;
use crate::services::{ServiceError, Services, create_services};

/// File name the exported deck is delivered under
pub const EXPORT_FILE_NAME: &str = "slides.pptx";

/// Images requested by a submit
const INITIAL_IMAGE_COUNT: u32 = 3;

/// An exported deck ready to hand to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            file_name: EXPORT_FILE_NAME,
            bytes,
        }
    }

    /// Write the file into `dir`, replacing any previous export
    pub fn save_in(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).context(format!("Failed to create {}", dir.display()))?;
        let path = dir.join(self.file_name);
        std::fs::write(&path, &self.bytes).context(format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), size = self.bytes.len(), "Saved exported deck");
        Ok(path)
    }
}

/// Owns the session state and drives every user action
pub struct Orchestrator {
    services: Services,
    composer: PromptComposer,
    state: SessionState,
    snapshots: watch::Sender<SessionSnapshot>,
    events: EventBus,
}

impl Orchestrator {
    pub fn new(services: Services, composer: PromptComposer) -> Self {
        Self::with_events(services, composer, EventBus::default())
    }

    /// Wire up the configured HTTP services and prompt templates
    pub fn from_config(config: &Config) -> Result<Self> {
        let prompts = PromptLoader::from_dir(config.prompts.expanded_dir().as_deref());
        let services = create_services(config, &prompts).context("Failed to create services")?;
        Ok(Self::new(services, PromptComposer::new(prompts)))
    }

    /// Create an orchestrator that emits onto an existing bus
    pub fn with_events(services: Services, composer: PromptComposer, events: EventBus) -> Self {
        let state = SessionState::new();
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            services,
            composer,
            state,
            snapshots,
            events,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }

    fn transition(&mut self, phase: Phase) {
        self.state.set_phase(phase);
        self.publish();
    }

    /// Mark an action as started; dropping the guard unfinished restores `resume`
    fn begin(&mut self, resume: Phase) -> InFlight<'_> {
        InFlight {
            orch: self,
            resume,
            tasks: Vec::new(),
            done: false,
        }
    }

    /// Generate a fresh (or refined) set of three images from user text
    pub async fn submit(&mut self, text: &str) -> Outcome {
        if self.state.loading() {
            return Outcome::Rejected(Rejection::Busy);
        }
        if self.state.exporting() {
            return Outcome::Rejected(Rejection::ExportInFlight);
        }
        info!(text_len = text.len(), "submit: called");

        let mut action = self.begin(Phase::Idle);
        action.state.set_tips(None);
        let mut tips = action.spawn_advice(text);
        if let Some(handle) = &tips {
            action.track(handle);
        }

        action.transition(Phase::Translating);
        let detected = pattern::detect(text);
        if let Some(warning) = detected.warning() {
            action.events.warn(warning);
        }

        let translator = Arc::clone(&action.services.translator);
        let raw = text.to_string();
        let translated = action
            .while_advising(async move { translator.translate(&raw).await }, &mut tips)
            .await;
        let translated = match translated {
            Ok(translated) => translated,
            Err(e) => {
                warn!(error = %e, "submit: translation failed, using original text");
                action.events.warn(Warning::TranslationFailed);
                text.to_string()
            }
        };

        action.transition(Phase::Composing);
        let prompt = match action.composer.compose(&translated, detected.slot(), action.state.slot_prompts()) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "submit: prompt composition failed");
                let outcome = action.finish_submit(tips, Outcome::Failed(Warning::GenerationFailed));
                action.finish();
                return outcome;
            }
        };
        debug!(prompt_len = prompt.len(), slot = ?detected.slot(), "submit: composed prompt");

        action.transition(Phase::GeneratingInitial);
        let images = Arc::clone(&action.services.images);
        let request = prompt.clone();
        let generated = action
            .while_advising(
                async move { images.generate(&request, INITIAL_IMAGE_COUNT).await },
                &mut tips,
            )
            .await;

        let outcome = match generated.map(complete_triad) {
            Ok(Some(triad)) => {
                action.state.apply_generation(triad, prompt);
                Outcome::Completed(())
            }
            Ok(None) => {
                warn!("submit: image service returned an incomplete set");
                Outcome::Failed(Warning::GenerationFailed)
            }
            Err(e) => {
                warn!(error = %e, "submit: image generation failed");
                Outcome::Failed(Warning::GenerationFailed)
            }
        };
        let outcome = action.finish_submit(tips, outcome);
        action.finish();
        outcome
    }

    fn finish_submit(&mut self, tips: Option<JoinHandle<String>>, outcome: Outcome) -> Outcome {
        if let Some(handle) = tips {
            handle.abort();
        }
        if let Outcome::Failed(warning) = &outcome {
            self.events.warn(warning.clone());
        }
        let next = if outcome.is_completed() { Phase::PreviewReady } else { Phase::Idle };
        self.state.set_tips(None);
        self.state.set_phase(next);
        self.events.emit(SessionEvent::TipsCleared);
        self.publish();
        outcome
    }

    /// Start the best-effort tips request, if an advisor is configured
    fn spawn_advice(&mut self, text: &str) -> Option<JoinHandle<String>> {
        let advisor = self.services.advisor.clone()?;
        let prompt = match self.composer.advice_prompt(text) {
            Ok(prompt) => prompt,
            Err(e) => {
                debug!(error = %e, "spawn_advice: no advice prompt");
                return None;
            }
        };
        self.transition(Phase::Advising);
        Some(tokio::spawn(async move {
            match advisor.advise(&prompt).await {
                Ok(tips) => tips,
                Err(e) => {
                    debug!(error = %e, "advice request failed");
                    ADVICE_FALLBACK.to_string()
                }
            }
        }))
    }

    /// Await `fut`, showing tips as soon as they arrive
    async fn while_advising<F, T>(&mut self, fut: F, tips: &mut Option<JoinHandle<String>>) -> T
    where
        F: Future<Output = T>,
    {
        let mut fut = std::pin::pin!(fut);
        loop {
            let Some(handle) = tips.as_mut() else {
                return fut.await;
            };
            let joined = tokio::select! {
                out = &mut fut => return out,
                joined = handle => joined,
            };
            *tips = None;
            let text = joined.unwrap_or_else(|e| {
                debug!(error = %e, "advice task did not finish");
                ADVICE_FALLBACK.to_string()
            });
            self.show_tips(text);
        }
    }

    fn show_tips(&mut self, text: String) {
        if text.trim().is_empty() || !self.state.loading() {
            return;
        }
        self.state.set_tips(Some(text.clone()));
        self.events.emit(SessionEvent::Tips(text));
        self.publish();
    }

    /// Expand one slot into a title/content/divider triad
    pub async fn preview(&mut self, slot: Slot) -> Outcome {
        let Some(title) = self.state.image(slot).filter(|img| !img.is_empty()).cloned() else {
            self.events.warn(Warning::GenerateFirst);
            return Outcome::Rejected(Rejection::EmptySlot);
        };
        if self.state.loading() {
            return Outcome::Rejected(Rejection::Busy);
        }
        if !self.state.preview_enabled() {
            return Outcome::Rejected(Rejection::PreviewUnavailable);
        }
        info!(%slot, "preview: called");
        let resume = self.state.phase();

        let base = self.state.slot_prompt(slot).map(str::to_string);
        let (content_prompt, divider_prompt) = match self.composer.preview_prompts(base.as_deref()) {
            Ok(prompts) => prompts,
            Err(e) => {
                warn!(error = %e, "preview: prompt composition failed");
                self.events.warn(Warning::PreviewFailed);
                return Outcome::Failed(Warning::PreviewFailed);
            }
        };

        let mut action = self.begin(resume);
        action.transition(Phase::ExpandingPreview);
        let content_task = {
            let images = Arc::clone(&action.services.images);
            tokio::spawn(async move { images.generate(&content_prompt, 1).await })
        };
        let divider_task = {
            let images = Arc::clone(&action.services.images);
            tokio::spawn(async move { images.generate(&divider_prompt, 1).await })
        };
        action.track(&content_task);
        action.track(&divider_task);
        let (content, divider) = tokio::join!(content_task, divider_task);

        let outcome = match (single_image(content), single_image(divider)) {
            (Some(content), Some(divider)) => {
                action.state.apply_preview(title, content, divider);
                action.transition(Phase::ExportReady);
                Outcome::Completed(())
            }
            _ => {
                action.events.warn(Warning::PreviewFailed);
                // Images are untouched, so the same expansion can be retried
                action.transition(resume);
                Outcome::Failed(Warning::PreviewFailed)
            }
        };
        action.finish();
        outcome
    }

    /// Send the current triad to the exporter
    pub async fn export(&mut self) -> Outcome<Download> {
        if self.state.exporting() {
            return Outcome::Rejected(Rejection::ExportInFlight);
        }
        if !self.state.export_enabled() {
            return Outcome::Rejected(Rejection::ExportUnavailable);
        }
        let Some(images) = self.state.image_triad() else {
            return Outcome::Rejected(Rejection::ExportUnavailable);
        };
        info!("export: called");

        let mut action = self.begin(Phase::ExportReady);
        action.transition(Phase::Exporting);
        let exporter = Arc::clone(&action.services.exporter);
        let result = exporter.export(&images).await;
        action.transition(Phase::ExportReady);
        action.finish();

        match result {
            Ok(bytes) => Outcome::Completed(Download::new(bytes)),
            Err(e) => {
                warn!(error = %e, "export: failed");
                self.events.warn(Warning::ExportFailed);
                Outcome::Failed(Warning::ExportFailed)
            }
        }
    }
}

/// An action in progress
///
/// If the action future is dropped before `finish`, the spawned tasks are
/// aborted, tips are cleared and the phase goes back to `resume`.
struct InFlight<'a> {
    orch: &'a mut Orchestrator,
    resume: Phase,
    tasks: Vec<AbortHandle>,
    done: bool,
}

impl InFlight<'_> {
    fn track<T>(&mut self, handle: &JoinHandle<T>) {
        self.tasks.push(handle.abort_handle());
    }

    fn finish(mut self) {
        self.done = true;
    }
}

impl Deref for InFlight<'_> {
    type Target = Orchestrator;

    fn deref(&self) -> &Orchestrator {
        &*self.orch
    }
}

impl DerefMut for InFlight<'_> {
    fn deref_mut(&mut self) -> &mut Orchestrator {
        &mut *self.orch
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        if self.done {
            return;
        }
        warn!(phase = ?self.orch.state.phase(), resume = ?self.resume, "action dropped before completion");
        if self.orch.state.tips().is_some() {
            self.orch.state.set_tips(None);
            self.orch.events.emit(SessionEvent::TipsCleared);
        }
        self.orch.state.set_phase(self.resume);
        self.orch.publish();
    }
}

/// Exactly three non-empty references, in order
fn complete_triad(refs: Vec<ImageRef>) -> Option<[ImageRef; 3]> {
    let triad: [ImageRef; 3] = refs.try_into().ok()?;
    if triad.iter().any(ImageRef::is_empty) {
        return None;
    }
    Some(triad)
}

/// Exactly one non-empty reference from a spawned generation
fn single_image(joined: Result<Result<Vec<ImageRef>, ServiceError>, JoinError>) -> Option<ImageRef> {
    match joined {
        Ok(Ok(refs)) => match <[ImageRef; 1]>::try_from(refs) {
            Ok([image]) if !image.is_empty() => Some(image),
            Ok(_) | Err(_) => {
                warn!("preview: image service did not return exactly one image");
                None
            }
        },
        Ok(Err(e)) => {
            warn!(error = %e, "preview: image generation failed");
            None
        }
        Err(e) => {
            warn!(error = %e, "preview: image task failed");
            None
        }
    }
}
