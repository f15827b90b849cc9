//! Vector store abstraction for Vidya.
//!
//! Provides a trait-based interface for different vector database backends.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form passage metadata (page, section, chapter, ...).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A textbook passage stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Unique passage ID.
    pub id: String,
    /// Source document this passage came from (file name, chapter, ...).
    pub source: String,
    /// Text content.
    pub content: String,
    /// Remaining fields of the imported record.
    pub metadata: Metadata,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this passage was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Passage {
    /// Create a new passage. A random id is assigned when `id` is `None`.
    pub fn new(
        id: Option<String>,
        source: String,
        content: String,
        metadata: Metadata,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            source,
            content,
            metadata,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched passage.
    pub passage: Passage,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    pub source: String,
    pub passage_count: u32,
    /// Most recent indexing time among the source's passages.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk upsert passages.
    async fn upsert_batch(&self, passages: &[Passage]) -> Result<usize>;

    /// Search for the most similar passages scoring at least `min_score`.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Delete all passages of a source.
    async fn delete_by_source(&self, source: &str) -> Result<usize>;

    /// List indexed sources, most recently indexed first.
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;

    /// Get total passage count.
    async fn passage_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Rank candidates by similarity, keeping the best `limit` above `min_score`.
pub(crate) fn rank(
    candidates: impl Iterator<Item = Passage>,
    query_embedding: &[f32],
    limit: usize,
    min_score: f32,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = candidates
        .map(|passage| {
            let score = cosine_similarity(query_embedding, &passage.embedding);
            SearchResult { passage, score }
        })
        .filter(|r| r.score >= min_score)
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}
