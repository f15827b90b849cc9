//! OpenAI client configuration.

use crate::config::LlmSettings;
use crate::error::{Result, VidyaError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from explicit settings.
///
/// The key must already be resolved into `settings.api_key`; the ambient
/// environment is not consulted here.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key.as_deref().ok_or_else(|| {
        VidyaError::Config("OpenAI API key is not configured".to_string())
    })?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
