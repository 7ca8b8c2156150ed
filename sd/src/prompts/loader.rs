//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Variables available to prompt templates
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext<'a> {
    /// User text (translated for image prompts, raw for advice prompts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    /// Prompt being extended (refinement and preview templates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<&'a str>,
}

impl<'a> PromptContext<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            text: Some(text),
            base: None,
        }
    }

    pub fn base(base: &'a str) -> Self {
        Self {
            text: None,
            base: Some(base),
        }
    }

    pub fn base_and_text(base: &'a str, text: &'a str) -> Self {
        Self {
            text: Some(text),
            base: Some(base),
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (from `prompts.dir` in config)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `dir` before the embedded prompts
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            hbs: Self::engine(),
            override_dir: if dir.exists() { Some(dir.to_path_buf()) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    /// Build from an optional override directory
    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self::new(dir),
            None => Self::embedded_only(),
        }
    }

    // Prompts are plain text sent to APIs; quotes must survive verbatim.
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    ///
    /// The trailing newline of the template file is not part of the prompt.
    pub fn render(&self, template_name: &str, context: &PromptContext<'_>) -> Result<String> {
        let template = self.load_template(template_name)?;
        debug!(%template_name, "render: called");

        self.hbs
            .render_template(template.trim_end(), context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}
