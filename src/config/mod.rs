//! Configuration module for Vidya.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::Prompts;
pub use settings::{
    EmbeddingSettings, GeneralSettings, GraphSettings, LlmSettings, PromptSettings,
    RetrievalSettings, ServerSettings, Settings, SpeechSettings, VectorStoreSettings,
    VideoSettings, OPENAI_API_KEY_ENV, SARVAM_API_KEY_ENV, SERPAPI_API_KEY_ENV,
};
