//! Loading pre-embedded passages into the vector store.
//!
//! The input is JSON Lines, one record per line, in the shape produced by a
//! `mongoexport` of a LangChain-style collection: a text field, an embedding
//! field, an optional `_id` (plain string or `{"$oid": ...}`) and any other
//! fields, which are kept as metadata. No embeddings are computed here.

use crate::error::{Result, VidyaError};
use crate::vector_store::{Metadata, Passage, VectorStore};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

const BATCH_SIZE: usize = 500;

/// Field names and defaults used while parsing records.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub text_key: String,
    pub embedding_key: String,
    pub source_key: String,
    /// Source assigned to records without a `source_key` field.
    pub default_source: String,
    /// Reject records whose embedding length differs. Inferred from the
    /// first valid record when `None`.
    pub expected_dimensions: Option<usize>,
    /// Delete existing passages of every imported source first.
    pub replace: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            text_key: "text".to_string(),
            embedding_key: "embedding".to_string(),
            source_key: "source".to_string(),
            default_source: "default".to_string(),
            expected_dimensions: None,
            replace: false,
        }
    }
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub replaced: usize,
    pub sources: Vec<String>,
}

/// Parse one JSON record into a passage.
pub fn parse_record(line: &str, options: &ImportOptions) -> Result<Passage> {
    let value: Value = serde_json::from_str(line)?;
    let Value::Object(mut fields) = value else {
        return Err(VidyaError::InvalidInput("record is not a JSON object".to_string()));
    };

    let text = match fields.remove(&options.text_key) {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        _ => {
            return Err(VidyaError::InvalidInput(format!(
                "missing or empty '{}' field",
                options.text_key
            )))
        }
    };

    let embedding = match fields.remove(&options.embedding_key) {
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                VidyaError::InvalidInput(format!(
                    "'{}' must be a non-empty array of numbers",
                    options.embedding_key
                ))
            })?,
        _ => {
            return Err(VidyaError::InvalidInput(format!(
                "missing '{}' field",
                options.embedding_key
            )))
        }
    };

    let id = match fields.remove("_id") {
        Some(Value::String(id)) => Some(id),
        Some(Value::Object(oid)) => oid.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    let source = match fields.remove(&options.source_key) {
        Some(Value::String(source)) if !source.is_empty() => source,
        _ => options.default_source.clone(),
    };

    let metadata: Metadata = fields;
    Ok(Passage::new(id, source, text, metadata, embedding))
}

/// Imports JSON Lines files into a vector store.
pub struct Importer {
    vector_store: Arc<dyn VectorStore>,
    options: ImportOptions,
}

impl Importer {
    pub fn new(vector_store: Arc<dyn VectorStore>, options: ImportOptions) -> Self {
        Self {
            vector_store,
            options,
        }
    }

    /// Import a file from disk.
    #[instrument(skip(self))]
    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary> {
        let content = std::fs::read_to_string(path)?;
        self.import_str(&content).await
    }

    /// Import records from JSON Lines text.
    pub async fn import_str(&self, content: &str) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut passages = Vec::new();
        let mut dimensions = self.options.expected_dimensions;

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match parse_record(line, &self.options) {
                Ok(passage) => {
                    let expected = *dimensions.get_or_insert(passage.embedding.len());
                    if passage.embedding.len() != expected {
                        warn!(
                            "Skipping line {}: embedding has {} dimensions, expected {}",
                            index + 1,
                            passage.embedding.len(),
                            expected
                        );
                        summary.skipped += 1;
                        continue;
                    }
                    passages.push(passage);
                }
                Err(e) => {
                    warn!("Skipping line {}: {}", index + 1, e);
                    summary.skipped += 1;
                }
            }
        }

        let sources: BTreeSet<String> = passages.iter().map(|p| p.source.clone()).collect();

        if self.options.replace {
            for source in &sources {
                summary.replaced += self.vector_store.delete_by_source(source).await?;
            }
        }

        for batch in passages.chunks(BATCH_SIZE) {
            summary.imported += self.vector_store.upsert_batch(batch).await?;
        }

        summary.sources = sources.into_iter().collect();
        info!(
            "Imported {} passages ({} skipped, {} replaced)",
            summary.imported, summary.skipped, summary.replaced
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::MemoryVectorStore;

    #[test]
    fn test_parse_mongo_export_record() {
        let line = r#"{"_id":{"$oid":"65f0c0ffee"},"text":"Sound travels as a wave.","embedding":[0.1,0.2],"page":163,"source":"ncert_sound.pdf"}"#;
        let passage = parse_record(line, &ImportOptions::default()).unwrap();

        assert_eq!(passage.id, "65f0c0ffee");
        assert_eq!(passage.source, "ncert_sound.pdf");
        assert_eq!(passage.content, "Sound travels as a wave.");
        assert_eq!(passage.embedding.len(), 2);
        assert_eq!(passage.metadata["page"], 163);
        assert!(!passage.metadata.contains_key("text"));
    }

    #[test]
    fn test_parse_custom_keys_and_default_source() {
        let options = ImportOptions {
            text_key: "page_content".to_string(),
            embedding_key: "vector".to_string(),
            default_source: "sound".to_string(),
            ..ImportOptions::default()
        };
        let passage =
            parse_record(r#"{"page_content":"Hertz is the unit of frequency.","vector":[1,0]}"#, &options)
                .unwrap();

        assert_eq!(passage.source, "sound");
        assert_eq!(passage.embedding, vec![1.0, 0.0]);
    }

    #[test]
    fn test_parse_rejects_bad_records() {
        let options = ImportOptions::default();
        assert!(parse_record("[1, 2]", &options).is_err());
        assert!(parse_record(r#"{"text":"no vector"}"#, &options).is_err());
        assert!(parse_record(r#"{"text":"bad","embedding":["x"]}"#, &options).is_err());
        assert!(parse_record(r#"{"text":"  ","embedding":[1.0]}"#, &options).is_err());
    }

    #[tokio::test]
    async fn test_import_skips_invalid_lines_and_mismatched_dimensions() {
        let store = Arc::new(MemoryVectorStore::new());
        let importer = Importer::new(store.clone(), ImportOptions::default());

        let content = [
            r#"{"text":"Amplitude sets loudness.","embedding":[1.0,0.0]}"#,
            "",
            "not json",
            r#"{"text":"Wrong size.","embedding":[1.0,0.0,0.0]}"#,
            r#"{"text":"Sonar uses ultrasound.","embedding":[0.0,1.0],"source":"ch11"}"#,
        ]
        .join("\n");

        let summary = importer.import_str(&content).await.unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.sources, vec!["ch11".to_string(), "default".to_string()]);
        assert_eq!(store.passage_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_import_replace_removes_previous_passages() {
        let store = Arc::new(MemoryVectorStore::new());
        let line = r#"{"text":"Echo needs 17.2 m distance.","embedding":[1.0],"source":"ch11"}"#;

        Importer::new(store.clone(), ImportOptions::default())
            .import_str(line)
            .await
            .unwrap();

        let options = ImportOptions {
            replace: true,
            ..ImportOptions::default()
        };
        let summary = Importer::new(store.clone(), options).import_str(line).await.unwrap();

        assert_eq!(summary.replaced, 1);
        assert_eq!(store.passage_count().await.unwrap(), 1);
    }
}
