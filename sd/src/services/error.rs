//! Service error types

use thiserror::Error;

/// Errors that can occur when calling an external service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),
}

impl ServiceError {
    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Api { status, .. } => Some(*status),
            ServiceError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
