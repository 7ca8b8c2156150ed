//! External service contracts
//!
//! The session only talks to translation, image, advice and export services
//! through these traits. Each call is a single attempt; callers decide how to
//! recover.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Context, Result};
use tracing::debug;

mod error;
mod export;
#[cfg(test)]
pub mod mock;
mod openai;

pub use error::ServiceError;
pub use export::HttpExporter;
pub use openai::{OpenAIAdvisor, OpenAIClient, OpenAIImageGenerator, OpenAITranslator};

use crate::config::Config;
use crate::prompts::PromptLoader;
use crate::session::ImageRef;

/// Text → English text
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, ServiceError>;
}

/// Prompt → generated image locators
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Request `count` images for one prompt
    ///
    /// A successful call may still return fewer than `count` references, or
    /// blank ones; callers validate the result.
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<ImageRef>, ServiceError>;
}

/// Prompt → short advice text
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    async fn advise(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Three background images → slide-deck file bytes
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, images: &[ImageRef; 3]) -> Result<Vec<u8>, ServiceError>;
}

/// Service handles injected into the orchestrator
#[derive(Clone)]
pub struct Services {
    pub translator: Arc<dyn Translator>,
    pub images: Arc<dyn ImageGenerator>,
    /// `None` disables the tips sub-flow
    pub advisor: Option<Arc<dyn AdviceGenerator>>,
    pub exporter: Arc<dyn Exporter>,
}

/// Build the HTTP-backed services described by the config
pub fn create_services(config: &Config, prompts: &PromptLoader) -> Result<Services> {
    debug!(base_url = %config.openai.base_url, "create_services: called");
    let client = Arc::new(OpenAIClient::from_config(&config.openai).context("Failed to create OpenAI client")?);

    let translate_system = prompts.render("translate", &Default::default())?;
    let translator = OpenAITranslator::new(Arc::clone(&client), &config.translation.model, translate_system);
    let images = OpenAIImageGenerator::new(Arc::clone(&client), &config.images);

    let advisor: Option<Arc<dyn AdviceGenerator>> = if config.advice.enabled {
        Some(Arc::new(OpenAIAdvisor::new(Arc::clone(&client), &config.advice)))
    } else {
        debug!("create_services: advice disabled");
        None
    };

    let exporter = HttpExporter::from_config(&config.export).context("Failed to create exporter")?;

    Ok(Services {
        translator: Arc::new(translator),
        images: Arc::new(images),
        advisor,
        exporter: Arc::new(exporter),
    })
}
