//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::openai::create_client;
use crate::retrieval::{Retriever, VectorRetriever};
use crate::vector_store::SqliteVectorStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: Option<usize>,
    min_score: Option<f32>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let db_path = settings.sqlite_path();
    if !db_path.exists() {
        Output::warning("No passages indexed yet. Use 'vidya import <file.jsonl>' first.");
        return Ok(());
    }

    let client = create_client(&settings.llm)?;
    let embedder = Arc::new(OpenAIEmbedder::new(client, &settings.embedding));
    let vector_store = Arc::new(SqliteVectorStore::new(&db_path)?);

    let retriever = VectorRetriever::new(vector_store, embedder)
        .with_top_k(limit.unwrap_or(settings.retrieval.top_k))
        .with_min_score(min_score.unwrap_or(settings.retrieval.min_score));

    let spinner = Output::spinner("Searching...");
    let results = retriever.search(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(documents) if documents.is_empty() => {
            Output::warning("No results found matching your query.");
        }
        Ok(documents) => {
            Output::success(&format!("Found {} results", documents.len()));
            for document in &documents {
                let source = document
                    .metadata
                    .get("source")
                    .and_then(|s| s.as_str())
                    .unwrap_or("unknown");
                Output::search_result(source, document.score, &document.text);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
