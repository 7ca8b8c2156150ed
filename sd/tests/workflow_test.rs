//! Integration tests for slidedeck
//!
//! These tests drive full sessions through the public API, first with
//! in-process fake services and then against mock HTTP endpoints.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use slidedeck::config::{AdviceConfig, ImagesConfig};
use slidedeck::events::SessionEvent;
use slidedeck::prompts::PromptLoader;
use slidedeck::services::{
    AdviceGenerator, Exporter, HttpExporter, ImageGenerator, OpenAIAdvisor, OpenAIClient, OpenAIImageGenerator,
    OpenAITranslator, ServiceError, Services, Translator,
};
use slidedeck::session::{ImageRef, Orchestrator, Outcome, PromptComposer, Rejection, Slot, SlotLabel, Warning};
use tempfile::TempDir;
use tokio::sync::broadcast;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Fakes
// =============================================================================

struct EchoTranslator;

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        Ok(format!("<{}>", text))
    }
}

/// Answers each request from a queue of canned replies, recording prompts
struct ScriptedImages {
    replies: Mutex<Vec<Vec<&'static str>>>,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl ScriptedImages {
    fn new(mut replies: Vec<Vec<&'static str>>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedImages {
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<ImageRef>, ServiceError> {
        self.prompts.lock().unwrap().push((prompt.to_string(), count));
        // Preview requests race; answer by prompt rather than queue order
        if count == 1 {
            let name = if prompt.ends_with("content slide.") { "content" } else { "divider" };
            return Ok(vec![ImageRef::new(format!("https://img.test/{}.png", name))]);
        }
        let reply = self.replies.lock().unwrap().pop().unwrap_or_default();
        Ok(reply.into_iter().map(ImageRef::new).collect())
    }
}

#[derive(Default)]
struct RecordingExporter {
    calls: Mutex<Vec<[ImageRef; 3]>>,
}

#[async_trait]
impl Exporter for RecordingExporter {
    async fn export(&self, images: &[ImageRef; 3]) -> Result<Vec<u8>, ServiceError> {
        self.calls.lock().unwrap().push(images.clone());
        Ok(b"PK\x03\x04deck".to_vec())
    }
}

fn orchestrator(images: Arc<ScriptedImages>, exporter: Arc<RecordingExporter>) -> Orchestrator {
    let services = Services {
        translator: Arc::new(EchoTranslator),
        images,
        advisor: None,
        exporter,
    };
    Orchestrator::new(services, PromptComposer::new(PromptLoader::embedded_only()))
}

fn warnings(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<Warning> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::Warning(w) = event {
            out.push(w);
        }
    }
    out
}

const TRIAD_1: [&str; 3] = ["https://img.test/a1.png", "https://img.test/b1.png", "https://img.test/c1.png"];
const TRIAD_2: [&str; 3] = ["https://img.test/a2.png", "https://img.test/b2.png", "https://img.test/c2.png"];

// =============================================================================
// Session scenarios
// =============================================================================

#[tokio::test]
async fn test_full_session_generate_refine_preview_export() {
    let images = Arc::new(ScriptedImages::new(vec![TRIAD_1.to_vec(), TRIAD_2.to_vec()]));
    let exporter = Arc::new(RecordingExporter::default());
    let mut orch = orchestrator(images.clone(), exporter.clone());
    let mut events = orch.events().subscribe();

    assert_eq!(orch.submit("ハワイ風の明るい雰囲気").await, Outcome::Completed(()));
    let first = orch.state().slot_prompt(Slot::B).unwrap().to_string();
    assert!(first.contains("\"<ハワイ風の明るい雰囲気>\""));

    assert_eq!(orch.submit("Bパターンを明るく").await, Outcome::Completed(()));
    let refined = orch.state().slot_prompt(Slot::B).unwrap().to_string();
    assert_eq!(
        refined,
        format!(
            "{} Additionally, incorporate the following user request: \"<Bパターンを明るく>\"",
            first
        )
    );
    assert_eq!(orch.state().image(Slot::B), Some(&ImageRef::new(TRIAD_2[1])));

    assert_eq!(orch.preview(Slot::B).await, Outcome::Completed(()));
    let triad = orch.state().image_triad().unwrap();
    assert_eq!(triad[0], ImageRef::new(TRIAD_2[1]));
    assert_eq!(triad[1], ImageRef::new("https://img.test/content.png"));
    assert_eq!(triad[2], ImageRef::new("https://img.test/divider.png"));
    assert_eq!(orch.state().slot_labels(), &SlotLabel::semantic());

    let preview_prompts: Vec<_> = images.prompts().into_iter().filter(|(_, n)| *n == 1).collect();
    assert_eq!(preview_prompts.len(), 2);
    assert!(preview_prompts.iter().all(|(p, _)| p.starts_with(&refined)));

    let Outcome::Completed(download) = orch.export().await else {
        panic!("export should complete");
    };
    let dir = TempDir::new().expect("Failed to create temp dir");
    let saved = download.save_in(dir.path()).unwrap();
    assert!(saved.ends_with("slides.pptx"));
    assert_eq!(exporter.calls.lock().unwrap().as_slice(), &[triad]);

    assert!(warnings(&mut events).is_empty());
}

#[tokio::test]
async fn test_ambiguous_reference_generates_fresh() {
    let images = Arc::new(ScriptedImages::new(vec![TRIAD_1.to_vec(), TRIAD_2.to_vec()]));
    let mut orch = orchestrator(images.clone(), Arc::default());
    let mut events = orch.events().subscribe();

    assert!(orch.submit("森").await.is_completed());
    assert!(orch.submit("AパターンとBパターンを組み合わせて").await.is_completed());

    assert_eq!(warnings(&mut events), vec![Warning::AmbiguousPattern]);
    let prompt = &images.prompts()[1].0;
    assert!(prompt.starts_with("Create a PowerPoint background image based on the following design idea:"));
    assert!(!prompt.contains("Additionally"));
}

#[tokio::test]
async fn test_preview_before_generation_warns() {
    let images = Arc::new(ScriptedImages::new(vec![]));
    let mut orch = orchestrator(images.clone(), Arc::default());
    let mut events = orch.events().subscribe();

    assert_eq!(orch.preview(Slot::A).await, Outcome::Rejected(Rejection::EmptySlot));
    assert_eq!(warnings(&mut events), vec![Warning::GenerateFirst]);
    assert!(images.prompts().is_empty());
    assert!(orch.state().images().iter().all(Option::is_none));
}

#[tokio::test]
async fn test_short_generation_keeps_previous_images() {
    let images = Arc::new(ScriptedImages::new(vec![
        TRIAD_1.to_vec(),
        vec!["https://img.test/only1.png", "https://img.test/only2.png"],
    ]));
    let mut orch = orchestrator(images, Arc::default());
    let mut events = orch.events().subscribe();

    assert!(orch.submit("森").await.is_completed());
    let before = orch.state().snapshot();

    assert_eq!(orch.submit("海").await, Outcome::Failed(Warning::GenerationFailed));
    let after = orch.state().snapshot();
    assert_eq!(after.images, before.images);
    assert_eq!(after.slot_prompts, before.slot_prompts);
    assert!(!after.preview_enabled);
    assert!(!after.loading);
    assert_eq!(warnings(&mut events), vec![Warning::GenerationFailed]);
}

#[tokio::test]
async fn test_export_requires_preview() {
    let images = Arc::new(ScriptedImages::new(vec![TRIAD_1.to_vec()]));
    let exporter = Arc::new(RecordingExporter::default());
    let mut orch = orchestrator(images, exporter.clone());

    assert!(orch.submit("森").await.is_completed());
    assert_eq!(orch.export().await, Outcome::Rejected(Rejection::ExportUnavailable));
    assert!(exporter.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_snapshots_published_for_each_transition() {
    let images = Arc::new(ScriptedImages::new(vec![TRIAD_1.to_vec()]));
    let mut orch = orchestrator(images, Arc::default());
    let rx = orch.subscribe();
    assert!(!rx.borrow().preview_enabled);

    assert!(orch.submit("森").await.is_completed());
    let snap = rx.borrow().clone();
    assert!(snap.preview_enabled);
    assert!(!snap.loading);
    assert_eq!(snap.images[0], Some(ImageRef::new(TRIAD_1[0])));
}

// =============================================================================
// HTTP services
// =============================================================================

fn http_services(openai: &MockServer, export: &MockServer) -> Services {
    let client = Arc::new(OpenAIClient::new("sk-test", openai.uri(), Duration::from_secs(5)).unwrap());
    let system = PromptLoader::embedded_only()
        .render("translate", &Default::default())
        .unwrap();
    Services {
        translator: Arc::new(OpenAITranslator::new(Arc::clone(&client), "gpt-4.1-mini", system)),
        images: Arc::new(OpenAIImageGenerator::new(Arc::clone(&client), &ImagesConfig::default())),
        advisor: Some(Arc::new(OpenAIAdvisor::new(Arc::clone(&client), &AdviceConfig::default()))
            as Arc<dyn AdviceGenerator>),
        exporter: Arc::new(HttpExporter::new(format!("{}/export", export.uri()), Duration::from_secs(5)).unwrap()),
    }
}

#[tokio::test]
async fn test_session_over_http() {
    let openai = MockServer::start().await;
    let export = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({ "model": "gpt-4.1-mini" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "A bright Hawaiian mood" } }]
        })))
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({ "model": "gpt-4o" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "文字は大きく" } }]
        })))
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_partial_json(serde_json::json!({ "n": 3, "size": "512x512" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "url": "https://img.test/1.png" },
                { "url": "https://img.test/2.png" },
                { "url": "https://img.test/3.png" }
            ]
        })))
        .expect(1)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_partial_json(serde_json::json!({ "n": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "url": "https://img.test/variant.png" }]
        })))
        .expect(2)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04deck".to_vec()))
        .expect(1)
        .mount(&export)
        .await;

    let services = http_services(&openai, &export);
    let mut orch = Orchestrator::new(services, PromptComposer::new(PromptLoader::embedded_only()));

    assert_eq!(orch.submit("ハワイ風の明るい雰囲気").await, Outcome::Completed(()));
    assert!(
        orch.state()
            .slot_prompt(Slot::A)
            .unwrap()
            .contains("\"A bright Hawaiian mood\"")
    );
    assert_eq!(orch.state().tips(), None);

    assert_eq!(orch.preview(Slot::C).await, Outcome::Completed(()));
    assert_eq!(orch.state().image(Slot::A), Some(&ImageRef::new("https://img.test/3.png")));

    let Outcome::Completed(download) = orch.export().await else {
        panic!("export should complete");
    };
    assert_eq!(download.file_name, "slides.pptx");
    assert!(download.bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_degraded_services_over_http() {
    let openai = MockServer::start().await;
    let export = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "url": "https://img.test/1.png" }, { "url": "https://img.test/2.png" }, { "url": "https://img.test/3.png" }]
        })))
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK".to_vec()))
        .expect(0)
        .mount(&export)
        .await;

    let services = http_services(&openai, &export);
    let mut orch = Orchestrator::new(services, PromptComposer::new(PromptLoader::embedded_only()));
    let mut events = orch.events().subscribe();

    // Translation fails, so the raw text goes into the prompt
    assert!(orch.submit("夕焼け").await.is_completed());
    assert!(orch.state().slot_prompt(Slot::A).unwrap().contains("\"夕焼け\""));

    // Variant requests also get three images back, which is not exactly one
    assert_eq!(orch.preview(Slot::A).await, Outcome::Failed(Warning::PreviewFailed));
    assert_eq!(orch.export().await, Outcome::Rejected(Rejection::ExportUnavailable));

    let seen = warnings(&mut events);
    assert!(seen.contains(&Warning::TranslationFailed));
    assert!(seen.contains(&Warning::PreviewFailed));
}
