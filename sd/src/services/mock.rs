//! Mock services for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Barrier, watch};
use tracing::debug;

use super::{AdviceGenerator, Exporter, ImageGenerator, ServiceError, Translator};
use crate::session::{ImageRef, SessionSnapshot};

fn failure(what: &str) -> ServiceError {
    ServiceError::Api {
        status: 500,
        message: format!("mock {} failure", what),
    }
}

/// Translator that wraps its input as `EN(...)`, or always fails
pub struct MockTranslator {
    fail: bool,
    calls: AtomicUsize,
}

impl MockTranslator {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        debug!("MockTranslator::translate: called");
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(failure("translation"));
        }
        Ok(format!("EN({})", text))
    }
}

type Responder = Box<dyn Fn(&str, u32) -> Result<Vec<ImageRef>, ServiceError> + Send + Sync>;

/// Image generator driven by a closure, recording every request
pub struct MockImageGenerator {
    responder: Responder,
    delay: Duration,
    single_barrier: Option<Arc<Barrier>>,
    requests: Mutex<Vec<(String, u32)>>,
}

impl MockImageGenerator {
    pub fn new(responder: impl Fn(&str, u32) -> Result<Vec<ImageRef>, ServiceError> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            delay: Duration::ZERO,
            single_barrier: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering so concurrent work gets a chance to run
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Numbered images for fresh requests, named images for preview variants
    ///
    /// Each call's references carry the call's prompt length so successive
    /// generations produce distinct URLs.
    pub fn working() -> Self {
        Self::new(|prompt, count| {
            if prompt.contains("content slide") {
                return Ok(vec![ImageRef::new("https://img.test/content.png")]);
            }
            if prompt.contains("section divider") {
                return Ok(vec![ImageRef::new("https://img.test/divider.png")]);
            }
            Ok((1..=count)
                .map(|n| ImageRef::new(format!("https://img.test/{}-{}.png", prompt.len(), n)))
                .collect())
        })
    }

    /// Single-image requests wait on `barrier` before answering
    pub fn with_single_image_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.single_barrier = Some(barrier);
        self
    }

    pub fn failing() -> Self {
        Self::new(|_, _| Err(failure("image")))
    }

    /// Always returns the given references
    pub fn returning(refs: Vec<&'static str>) -> Self {
        Self::new(move |_, _| Ok(refs.iter().map(|r| ImageRef::new(*r)).collect()))
    }

    pub fn requests(&self) -> Vec<(String, u32)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<ImageRef>, ServiceError> {
        debug!(count, "MockImageGenerator::generate: called");
        self.requests.lock().unwrap().push((prompt.to_string(), count));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(barrier) = self.single_barrier.as_ref().filter(|_| count == 1) {
            barrier.wait().await;
        }
        (self.responder)(prompt, count)
    }
}

/// Advice generator with an optional delay
pub struct MockAdvisor {
    reply: Option<String>,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl MockAdvisor {
    pub fn ok(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdviceGenerator for MockAdvisor {
    async fn advise(&self, prompt: &str) -> Result<String, ServiceError> {
        debug!("MockAdvisor::advise: called");
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone().ok_or_else(|| failure("advice"))
    }
}

/// Exporter that records the images it was given
///
/// Once `watch` is called it also records the session snapshot current at
/// the time of each export.
pub struct MockExporter {
    fail: bool,
    delay: Duration,
    exported: Mutex<Vec<[ImageRef; 3]>>,
    snapshots: OnceLock<watch::Receiver<SessionSnapshot>>,
    seen: Mutex<Vec<SessionSnapshot>>,
}

impl MockExporter {
    fn with_failure(fail: bool) -> Self {
        Self {
            fail,
            delay: Duration::ZERO,
            exported: Mutex::new(Vec::new()),
            snapshots: OnceLock::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn ok() -> Self {
        Self::with_failure(false)
    }

    pub fn failing() -> Self {
        Self::with_failure(true)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn watch(&self, snapshots: watch::Receiver<SessionSnapshot>) {
        let _ = self.snapshots.set(snapshots);
    }

    pub fn exported(&self) -> Vec<[ImageRef; 3]> {
        self.exported.lock().unwrap().clone()
    }

    pub fn seen(&self) -> Vec<SessionSnapshot> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Exporter for MockExporter {
    async fn export(&self, images: &[ImageRef; 3]) -> Result<Vec<u8>, ServiceError> {
        debug!("MockExporter::export: called");
        self.exported.lock().unwrap().push(images.clone());
        if let Some(rx) = self.snapshots.get() {
            self.seen.lock().unwrap().push(rx.borrow().clone());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(failure("export"));
        }
        Ok(b"PK\x03\x04mock-deck".to_vec())
    }
}
