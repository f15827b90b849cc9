//! Request pipeline: run the graph, then enrich the answer.

use crate::config::{Prompts, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::enrichment::{Enricher, VideoInfo};
use crate::error::{Result, VidyaError};
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::openai::create_client;
use crate::orchestrator::{GraphOutcome, RagGraph};
use crate::retrieval::{Retriever, VectorRetriever};
use crate::vector_store::SqliteVectorStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Response body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorResponse {
    pub answer: String,
    /// Base64 audio of the answer, `null` when unavailable.
    pub audio_base64: Option<String>,
    /// Suggested video, `null` when unavailable.
    pub suggested_video: Option<VideoInfo>,
}

/// Answers textbook questions.
///
/// Built once at startup; all clients inside are shared across requests.
pub struct Tutor {
    graph: RagGraph,
    enricher: Enricher,
}

impl Tutor {
    /// Create the OpenAI, SQLite and enrichment clients described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Arc::new(Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?);

        let client = create_client(&settings.llm)?;
        let model: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::new(client.clone()));
        let embedder = Arc::new(OpenAIEmbedder::new(client, &settings.embedding));

        let sqlite_path = settings.sqlite_path();
        if let Some(parent) = sqlite_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let vector_store = Arc::new(SqliteVectorStore::new(&sqlite_path)?);

        let retriever: Arc<dyn Retriever> = Arc::new(
            VectorRetriever::new(vector_store, embedder)
                .with_top_k(settings.retrieval.top_k)
                .with_min_score(settings.retrieval.min_score),
        );

        let graph = RagGraph::from_settings(settings, prompts.clone(), model.clone(), retriever);
        let enricher = Enricher::from_settings(settings, model, prompts);

        Ok(Self::with_components(graph, enricher))
    }

    /// Assemble a tutor from prebuilt parts.
    pub fn with_components(graph: RagGraph, enricher: Enricher) -> Self {
        Self { graph, enricher }
    }

    /// Answer a question with enrichment.
    pub async fn answer(&self, question: &str) -> Result<TutorResponse> {
        let (response, _) = self.answer_traced(question, true).await?;
        Ok(response)
    }

    /// Answer a question and also return the graph outcome.
    #[instrument(skip(self))]
    pub async fn answer_traced(&self, question: &str, enrich: bool) -> Result<(TutorResponse, GraphOutcome)> {
        let question = question.trim();
        if question.is_empty() {
            return Err(VidyaError::InvalidInput("question must not be empty".to_string()));
        }

        info!("Answering question");
        let outcome = self.graph.run(question).await?;

        let enrichment = if enrich {
            self.enricher.enrich(&outcome.answer).await
        } else {
            Default::default()
        };

        let response = TutorResponse {
            answer: outcome.answer.clone(),
            audio_base64: enrichment.audio_base64,
            suggested_video: enrichment.suggested_video,
        };
        Ok((response, outcome))
    }
}
