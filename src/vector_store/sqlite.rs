//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust. A textbook chapter is
//! a few hundred passages, so a full scan per query is cheap.

use super::{rank, IndexedSource, Metadata, Passage, SearchResult, VectorStore};
use crate::error::{Result, VidyaError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS passages (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        content TEXT NOT NULL,
        metadata TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_passages_source ON passages(source);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets request handlers read while an import is running
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VidyaError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_passage(row: &Row<'_>) -> rusqlite::Result<Passage> {
        let metadata_json: String = row.get(3)?;
        let embedding_bytes: Vec<u8> = row.get(4)?;
        let indexed_at: String = row.get(5)?;

        Ok(Passage {
            id: row.get(0)?,
            source: row.get(1)?,
            content: row.get(2)?,
            metadata: serde_json::from_str::<Metadata>(&metadata_json).unwrap_or_default(),
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: Self::parse_timestamp(&indexed_at),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, passages), fields(count = passages.len()))]
    async fn upsert_batch(&self, passages: &[Passage]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for passage in passages {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO passages
                (id, source, content, metadata, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    passage.id,
                    passage.source,
                    passage.content,
                    serde_json::to_string(&passage.metadata)?,
                    Self::embedding_to_bytes(&passage.embedding),
                    passage.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} passages", passages.len());
        Ok(passages.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, source, content, metadata, embedding, indexed_at FROM passages",
        )?;
        let passages = stmt
            .query_map([], Self::row_to_passage)?
            .filter_map(|p| p.ok());

        let results = rank(passages, query_embedding, limit, min_score);
        debug!("Found {} matching passages", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete_by_source(&self, source: &str) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute("DELETE FROM passages WHERE source = ?1", params![source])?;

        info!("Deleted {} passages for source {}", deleted, source);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source, COUNT(*) AS passage_count, MAX(indexed_at) AS indexed_at
            FROM passages
            GROUP BY source
            ORDER BY indexed_at DESC
            "#,
        )?;

        let sources = stmt.query_map([], |row| {
            let indexed_at: String = row.get(2)?;
            Ok(IndexedSource {
                source: row.get(0)?,
                passage_count: row.get(1)?,
                indexed_at: Self::parse_timestamp(&indexed_at),
            })
        })?;

        Ok(sources.filter_map(|s| s.ok()).collect())
    }

    async fn passage_count(&self) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM passages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(source: &str, content: &str, embedding: Vec<f32>) -> Passage {
        let mut metadata = Metadata::new();
        metadata.insert("page".to_string(), serde_json::json!(162));
        Passage::new(None, source.to_string(), content.to_string(), metadata, embedding)
    }

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store
            .upsert_batch(&[
                passage("ch11", "Echo is a reflected sound.", vec![1.0, 0.0, 0.0]),
                passage("ch11", "Pitch depends on frequency.", vec![0.0, 1.0, 0.0]),
                passage("ch12", "Electricity.", vec![0.0, 0.0, 1.0]),
            ])
            .await
            .unwrap();

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 2);

        let results = store.search_with_threshold(&[1.0, 0.0, 0.0], 1, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].passage.content, "Echo is a reflected sound.");
        assert_eq!(results[0].passage.metadata["page"], 162);
        assert!((results[0].score - 1.0).abs() < 0.001);

        let deleted = store.delete_by_source("ch11").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.passage_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            let mut p = passage("ch11", "Ultrasound has frequency above 20 kHz.", vec![0.5, 0.5]);
            p.id = "fixed-id".to_string();
            store.upsert_batch(&[p.clone()]).await.unwrap();
            // Re-importing the same id replaces instead of duplicating
            store.upsert_batch(&[p]).await.unwrap();
        }

        let reopened = SqliteVectorStore::new(&path).unwrap();
        assert_eq!(reopened.passage_count().await.unwrap(), 1);
    }
}
