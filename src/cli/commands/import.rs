//! Import command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::retrieval::{ImportOptions, Importer};
use crate::vector_store::{SqliteVectorStore, VectorStore};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Run the import command.
pub async fn run_import(file: &str, source: Option<String>, replace: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Import, &settings)?;

    let path = Settings::expand_path(file);
    if !path.exists() {
        Output::error(&format!("File not found: {}", path.display()));
        anyhow::bail!("file not found: {}", path.display());
    }

    let db_path = settings.sqlite_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let vector_store = Arc::new(SqliteVectorStore::new(&db_path)?);

    let options = import_options(&path, source, replace, &settings);
    let importer = Importer::new(vector_store.clone(), options);

    let spinner = Output::spinner(&format!("Importing {}...", path.display()));
    let result = importer.import_file(&path).await;
    spinner.finish_and_clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            Output::error(&format!("Import failed: {}", e));
            return Err(e.into());
        }
    };

    if summary.imported == 0 {
        Output::warning("No passages imported.");
    } else {
        Output::success(&format!("Imported {} passages", summary.imported));
    }
    Output::kv("Sources", &summary.sources.join(", "));
    if summary.replaced > 0 {
        Output::kv("Replaced", &summary.replaced.to_string());
    }
    if summary.skipped > 0 {
        Output::warning(&format!("Skipped {} invalid lines (run with -v for details)", summary.skipped));
    }
    Output::kv("Total passages", &vector_store.passage_count().await?.to_string());

    Ok(())
}

fn import_options(path: &Path, source: Option<String>, replace: bool, settings: &Settings) -> ImportOptions {
    let default_source = source.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "default".to_string())
    });

    ImportOptions {
        text_key: settings.retrieval.text_key.clone(),
        embedding_key: settings.retrieval.embedding_key.clone(),
        default_source,
        expected_dimensions: settings.embedding.dimensions.map(|d| d as usize),
        replace,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_options_default_source_from_file_stem() {
        let settings = Settings::default();
        let options = import_options(Path::new("/data/sound_chapter.jsonl"), None, true, &settings);

        assert_eq!(options.default_source, "sound_chapter");
        assert_eq!(options.text_key, "text");
        assert!(options.replace);

        let options = import_options(Path::new("x.jsonl"), Some("ncert".to_string()), false, &settings);
        assert_eq!(options.default_source, "ncert");
    }

    #[tokio::test]
    async fn test_run_import_into_temp_index() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sound.jsonl");
        std::fs::write(
            &file,
            "{\"text\":\"Echo is reflected sound.\",\"embedding\":[1.0,0.0]}\n{\"text\":\"Pitch\",\"embedding\":[0.0,1.0]}\n",
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.vector_store.sqlite_path = dir.path().join("index.db").to_string_lossy().into_owned();

        run_import(file.to_str().unwrap(), None, false, settings.clone()).await.unwrap();

        let store = SqliteVectorStore::new(&settings.sqlite_path()).unwrap();
        assert_eq!(store.passage_count().await.unwrap(), 2);
        assert_eq!(store.list_sources().await.unwrap()[0].source, "sound");
    }
}
