//! Passage retrieval over the vector index.
//!
//! The graph only sees the [`Retriever`] trait: a query string in, ranked
//! passages out.

mod import;

pub use import::{parse_record, ImportOptions, ImportSummary, Importer};

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{Metadata, SearchResult, VectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A passage returned by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    /// Passage text.
    pub text: String,
    /// Source metadata (always includes `source`).
    pub metadata: Metadata,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for RetrievedDocument {
    fn from(result: SearchResult) -> Self {
        let mut metadata = result.passage.metadata;
        metadata
            .entry("source".to_string())
            .or_insert_with(|| serde_json::Value::String(result.passage.source.clone()));

        Self {
            text: result.passage.content,
            metadata,
            score: result.score,
        }
    }
}

/// Trait for retrieval backends.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return passages relevant to `query`, best first.
    async fn search(&self, query: &str) -> Result<Vec<RetrievedDocument>>;
}

/// Retriever that embeds the query and searches a vector store.
pub struct VectorRetriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    min_score: f32,
}

impl VectorRetriever {
    /// Create a new retriever.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            top_k: 4,
            min_score: 0.0,
        }
    }

    /// Set the maximum number of passages returned.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    #[instrument(skip(self), fields(top_k = self.top_k))]
    async fn search(&self, query: &str) -> Result<Vec<RetrievedDocument>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self
            .vector_store
            .search_with_threshold(&query_embedding, self.top_k, self.min_score)
            .await?;

        debug!("Retrieved {} passages", results.len());
        Ok(results.into_iter().map(RetrievedDocument::from).collect())
    }
}

/// Render documents as the content of a tool message.
pub fn format_documents(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
