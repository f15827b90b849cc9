//! Error types for Vidya.

use thiserror::Error;

/// Library-level error type for Vidya operations.
#[derive(Error, Debug)]
pub enum VidyaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Graph execution failed: {0}")]
    Graph(String),

    #[error("Enrichment failed: {0}")]
    Enrichment(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Vidya operations.
pub type Result<T> = std::result::Result<T, VidyaError>;
