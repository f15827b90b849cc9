//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{Result, VidyaError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
}

impl OpenAIEmbedder {
    /// Create an embedder sharing an existing client.
    pub fn new(client: Client<OpenAIConfig>, settings: &EmbeddingSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.model)
            .input(EmbeddingInput::String(text.to_string()));
        if let Some(dimensions) = self.dimensions {
            args.dimensions(dimensions);
        }
        let request = args
            .build()
            .map_err(|e| VidyaError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self.client.embeddings().create(request).await.map_err(|e| {
            VidyaError::OpenAI(format!("Embedding API error: {}", e))
        })?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| VidyaError::Embedding("Empty embedding response".to_string()))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}
