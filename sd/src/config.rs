//! slidedeck configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main slidedeck configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenAI-compatible API connection
    pub openai: OpenAiConfig,

    /// Translation of the user's request
    pub translation: TranslationConfig,

    /// Tips shown while images are generating
    pub advice: AdviceConfig,

    /// Image generation
    pub images: ImagesConfig,

    /// Slide export service
    pub export: ExportConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variable is set.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.openai.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "API key not found. Set the {} environment variable.",
                self.openai.api_key_env
            ));
        }
        if !self.export.endpoint.starts_with("http://") && !self.export.endpoint.starts_with("https://") {
            return Err(eyre::eyre!("Export endpoint must be an http(s) URL: {}", self.export.endpoint));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .slidedeck.yml
        let local_config = PathBuf::from(".slidedeck.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/slidedeck/slidedeck.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("slidedeck").join("slidedeck.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// OpenAI-compatible API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// Translation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Chat model used for translation
    pub model: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".to_string(),
        }
    }
}

/// Advice (tips) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceConfig {
    /// Request tips while images generate
    pub enabled: bool,

    /// Chat model used for tips
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o".to_string(),
            temperature: 0.7,
        }
    }
}

/// Image generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Image model; omitted from requests when unset
    pub model: Option<String>,

    /// Requested image size
    pub size: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            model: None,
            size: "512x512".to_string(),
        }
    }
}

/// Slide export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Export service URL
    pub endpoint: String,

    /// Directory the exported deck is written to
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/export".to_string(),
            output_dir: PathBuf::from("."),
            timeout_ms: 120_000,
        }
    }
}

/// Prompt template settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory with `.pmt` overrides
    pub dir: Option<PathBuf>,
}

impl PromptsConfig {
    /// Override directory with `~/` expanded
    pub fn expanded_dir(&self) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        match dir.strip_prefix("~") {
            Ok(rest) => dirs::home_dir().map(|home| home.join(rest)),
            Err(_) => Some(dir.clone()),
        }
    }
}
