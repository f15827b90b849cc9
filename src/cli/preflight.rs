//! Pre-flight checks before expensive operations.
//!
//! Validates that required API keys are configured before starting
//! operations that would otherwise fail on the first model call.

use crate::config::{Settings, OPENAI_API_KEY_ENV, SARVAM_API_KEY_ENV, SERPAPI_API_KEY_ENV};
use crate::error::{Result, VidyaError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving requires the OpenAI key.
    Serve,
    /// Asking questions requires the OpenAI key.
    Ask,
    /// Search embeds the query, so it requires the OpenAI key.
    Search,
    /// Import reads embeddings from the file.
    Import,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Serve | Operation::Ask | Operation::Search => check_openai_key(settings),
        Operation::Import => Ok(()),
    }
}

/// Enrichment services that are enabled but have no API key.
///
/// These are not errors; the matching response fields are just always null.
pub fn missing_enrichment_keys(settings: &Settings) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if settings.speech.enabled && !has_key(&settings.speech.api_key) {
        missing.push(SARVAM_API_KEY_ENV);
    }
    if settings.video.enabled && !has_key(&settings.video.api_key) {
        missing.push(SERPAPI_API_KEY_ENV);
    }
    missing
}

fn check_openai_key(settings: &Settings) -> Result<()> {
    if has_key(&settings.llm.api_key) {
        Ok(())
    } else {
        Err(VidyaError::Config(format!(
            "{} not set. Set it with: export {}='sk-...' or llm.api_key in the config file",
            OPENAI_API_KEY_ENV, OPENAI_API_KEY_ENV
        )))
    }
}

fn has_key(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}
