//! Sources command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use anyhow::Result;

/// Run the sources command.
pub async fn run_sources(settings: Settings) -> Result<()> {
    let db_path = settings.sqlite_path();
    if !db_path.exists() {
        Output::info("No passages indexed yet. Use 'vidya import <file.jsonl>' to add content.");
        return Ok(());
    }

    let vector_store = SqliteVectorStore::new(&db_path)?;

    match vector_store.list_sources().await {
        Ok(sources) if sources.is_empty() => {
            Output::info("The index is empty. Use 'vidya import <file.jsonl>' to add content.");
        }
        Ok(sources) => {
            Output::header(&format!("Indexed Sources ({})", sources.len()));
            println!();

            for source in &sources {
                Output::source_info(
                    &source.source,
                    source.passage_count,
                    &source.indexed_at.format("%Y-%m-%d %H:%M").to_string(),
                );
            }

            let total: u32 = sources.iter().map(|s| s.passage_count).sum();
            println!();
            Output::kv("Total sources", &sources.len().to_string());
            Output::kv("Total passages", &total.to_string());
        }
        Err(e) => {
            Output::error(&format!("Failed to list sources: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
