//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{rank, IndexedSource, Passage, SearchResult, VectorStore};
use crate::error::{Result, VidyaError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store.
pub struct MemoryVectorStore {
    passages: RwLock<HashMap<String, Passage>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            passages: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Passage>>> {
        self.passages
            .read()
            .map_err(|e| VidyaError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Passage>>> {
        self.passages
            .write()
            .map_err(|e| VidyaError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, passages: &[Passage]) -> Result<usize> {
        let mut store = self.write()?;
        for passage in passages {
            store.insert(passage.id.clone(), passage.clone());
        }
        Ok(passages.len())
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let passages = self.read()?;
        Ok(rank(passages.values().cloned(), query_embedding, limit, min_score))
    }

    async fn delete_by_source(&self, source: &str) -> Result<usize> {
        let mut passages = self.write()?;
        let initial_len = passages.len();
        passages.retain(|_, p| p.source != source);
        Ok(initial_len - passages.len())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let passages = self.read()?;

        let mut source_map: HashMap<String, IndexedSource> = HashMap::new();

        for passage in passages.values() {
            let entry = source_map
                .entry(passage.source.clone())
                .or_insert_with(|| IndexedSource {
                    source: passage.source.clone(),
                    passage_count: 0,
                    indexed_at: passage.indexed_at,
                });

            entry.passage_count += 1;
            if passage.indexed_at > entry.indexed_at {
                entry.indexed_at = passage.indexed_at;
            }
        }

        let mut sources: Vec<IndexedSource> = source_map.into_values().collect();
        sources.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));

        Ok(sources)
    }

    async fn passage_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
