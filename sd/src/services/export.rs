//! Slide export over HTTP
//!
//! The export service accepts `{"images": [title, content, divider]}` and
//! answers with the finished `.pptx` file.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{Exporter, ServiceError};
use crate::config::ExportConfig;
use crate::session::ImageRef;

/// Exporter that posts image URLs to a slide-export service
pub struct HttpExporter {
    endpoint: String,
    http: Client,
}

impl HttpExporter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = Client::builder().timeout(timeout).build().map_err(ServiceError::Network)?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    pub fn from_config(config: &ExportConfig) -> Result<Self, ServiceError> {
        Self::new(&config.endpoint, Duration::from_millis(config.timeout_ms))
    }
}

#[async_trait]
impl Exporter for HttpExporter {
    async fn export(&self, images: &[ImageRef; 3]) -> Result<Vec<u8>, ServiceError> {
        debug!(endpoint = %self.endpoint, "export: called");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "images": images }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ServiceError::InvalidResponse("export returned an empty file".to_string()));
        }
        debug!(size = bytes.len(), "export: received file");
        Ok(bytes.to_vec())
    }
}
