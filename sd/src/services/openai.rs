//! OpenAI API client implementation
//!
//! One HTTP client backs the translator, the advisor and the image generator.
//! Chat calls go to `/v1/chat/completions`, image calls to
//! `/v1/images/generations`. Every call is a single attempt.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{AdviceGenerator, ImageGenerator, ServiceError, Translator};
use crate::config::{AdviceConfig, ImagesConfig, OpenAiConfig};
use crate::session::ImageRef;

/// OpenAI API client
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenAIClient {
    /// Create a client with an explicit key and base URL
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = Client::builder().timeout(timeout).build().map_err(ServiceError::Network)?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Create a client from config, reading the key from the environment
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, ServiceError> {
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "from_config: called");
        let api_key =
            std::env::var(&config.api_key_env).map_err(|_| ServiceError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(api_key, &config.base_url, Duration::from_millis(config.timeout_ms))
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(&self, path: &str, body: &serde_json::Value) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "post_json: API error");
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Run a chat completion and return the trimmed text of the first choice
    pub async fn chat(
        &self,
        model: &str,
        system: Option<&str>,
        user: &str,
        temperature: Option<f32>,
    ) -> Result<String, ServiceError> {
        debug!(%model, has_system = system.is_some(), user_len = user.len(), "chat: called");
        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": user }));

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });
        if let Some(temperature) = temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        let response: ChatResponse = self.post_json("/v1/chat/completions", &body).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        Ok(content)
    }

    /// Generate `n` images and return their URLs
    ///
    /// Entries without a URL come back as empty strings so the caller sees
    /// the count the service actually returned.
    pub async fn images(&self, model: Option<&str>, prompt: &str, n: u32, size: &str) -> Result<Vec<String>, ServiceError> {
        debug!(?model, n, %size, prompt_len = prompt.len(), "images: called");
        let mut body = serde_json::json!({
            "prompt": prompt,
            "n": n,
            "size": size,
            "response_format": "url",
        });
        if let Some(model) = model {
            body["model"] = serde_json::json!(model);
        }

        let response: ImagesResponse = self.post_json("/v1/images/generations", &body).await?;
        let urls: Vec<String> = response
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|d| d.url.unwrap_or_default())
            .collect();
        debug!(count = urls.len(), "images: received");
        Ok(urls)
    }
}

/// Translator backed by a chat model
pub struct OpenAITranslator {
    client: Arc<OpenAIClient>,
    model: String,
    system_prompt: String,
}

impl OpenAITranslator {
    pub fn new(client: Arc<OpenAIClient>, model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

#[async_trait]
impl Translator for OpenAITranslator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        let translated = self
            .client
            .chat(&self.model, Some(&self.system_prompt), text, None)
            .await?;
        // An empty answer is not a translation; keep the user's words
        if translated.is_empty() {
            debug!("translate: empty response, keeping original text");
            return Ok(text.to_string());
        }
        Ok(translated)
    }
}

/// Advice generator backed by a chat model
pub struct OpenAIAdvisor {
    client: Arc<OpenAIClient>,
    model: String,
    temperature: f32,
}

impl OpenAIAdvisor {
    pub fn new(client: Arc<OpenAIClient>, config: &AdviceConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl AdviceGenerator for OpenAIAdvisor {
    async fn advise(&self, prompt: &str) -> Result<String, ServiceError> {
        self.client
            .chat(&self.model, None, prompt, Some(self.temperature))
            .await
    }
}

/// Image generator backed by the images endpoint
pub struct OpenAIImageGenerator {
    client: Arc<OpenAIClient>,
    model: Option<String>,
    size: String,
}

impl OpenAIImageGenerator {
    pub fn new(client: Arc<OpenAIClient>, config: &ImagesConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            size: config.size.clone(),
        }
    }
}

#[async_trait]
impl ImageGenerator for OpenAIImageGenerator {
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<ImageRef>, ServiceError> {
        let urls = self
            .client
            .images(self.model.as_deref(), prompt, count, &self.size)
            .await?;
        Ok(urls.into_iter().map(ImageRef::from).collect())
    }
}

// === API response types ===

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Option<Vec<ImageDatum>>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
}
