//! Configuration settings for Vidya.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the Sarvam text-to-speech subscription key.
pub const SARVAM_API_KEY_ENV: &str = "SARVAM_API_KEY";
/// Environment variable holding the SerpAPI key used for video search.
pub const SERPAPI_API_KEY_ENV: &str = "SERPAPI_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub retrieval: RetrievalSettings,
    pub graph: GraphSettings,
    pub server: ServerSettings,
    pub speech: SpeechSettings,
    pub video: VideoSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vidya".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Language model settings. Each graph node uses its own model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Override for the OpenAI-compatible API base URL.
    pub api_base: Option<String>,
    /// API key. Falls back to `OPENAI_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Tool-calling model that decides whether to retrieve.
    pub agent_model: String,
    /// Model that grades retrieved passages.
    pub grader_model: String,
    /// Model that rewrites the question after an irrelevant retrieval.
    pub rewriter_model: String,
    /// Model that writes the final answer.
    pub generator_model: String,
    /// Model that extracts topics for the video suggestion.
    pub topics_model: String,
    /// Sampling temperature for every call.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key: None,
            agent_model: "gpt-4-turbo-preview".to_string(),
            grader_model: "gpt-4-0125-preview".to_string(),
            rewriter_model: "gpt-4-0125-preview".to_string(),
            generator_model: "gpt-4o".to_string(),
            topics_model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

/// Query embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model; must match the model the corpus was embedded with.
    pub model: String,
    /// Requested dimensions (only supported by text-embedding-3 models).
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimensions: None,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Path to the SQLite vector index.
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.vidya/index.db".to_string(),
        }
    }
}

/// Retriever and retriever-tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of passages returned per search.
    pub top_k: usize,
    /// Minimum cosine similarity for a passage to be returned.
    pub min_score: f32,
    /// Name of the retrieval tool offered to the agent.
    pub tool_name: String,
    /// Description of the retrieval tool offered to the agent.
    pub tool_description: String,
    /// Field holding passage text in imported records.
    pub text_key: String,
    /// Field holding the embedding vector in imported records.
    pub embedding_key: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: 0.0,
            tool_name: "retrieve_textbook".to_string(),
            tool_description:
                "Search and return information about the Sound chapter of the NCERT textbook."
                    .to_string(),
            text_key: "text".to_string(),
            embedding_key: "embedding".to_string(),
        }
    }
}

/// State graph settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Rewrites allowed before a best-effort answer is forced.
    pub max_rewrites: u32,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self { max_rewrites: 3 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Text-to-speech settings (Sarvam API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub enabled: bool,
    pub endpoint: String,
    /// Subscription key. Falls back to `SARVAM_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub target_language_code: String,
    pub speaker: String,
    pub pitch: f32,
    pub pace: f32,
    pub loudness: f32,
    pub speech_sample_rate: u32,
    pub enable_preprocessing: bool,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.sarvam.ai/text-to-speech".to_string(),
            api_key: None,
            target_language_code: "hi-IN".to_string(),
            speaker: "meera".to_string(),
            pitch: 0.0,
            pace: 1.65,
            loudness: 1.5,
            speech_sample_rate: 8000,
            enable_preprocessing: true,
            model: "bulbul:v1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Video suggestion settings (SerpAPI YouTube engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub enabled: bool,
    pub endpoint: String,
    /// API key. Falls back to `SERPAPI_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Prepended to the extracted topics to form the search query.
    pub query_prefix: String,
    pub timeout_secs: u64,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://serpapi.com/search.json".to_string(),
            api_key: None,
            query_prefix: "NCERT Sound".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory containing a `prompts.toml` override.
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// API keys missing from the file are taken from the environment.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    /// Fill unset API keys using `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.llm.api_key.is_none() {
            self.llm.api_key = non_empty(OPENAI_API_KEY_ENV);
        }
        if self.speech.api_key.is_none() {
            self.speech.api_key = non_empty(SARVAM_API_KEY_ENV);
        }
        if self.video.api_key.is_none() {
            self.video.api_key = non_empty(SERPAPI_API_KEY_ENV);
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VidyaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Copy of the settings with API keys removed, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.llm.api_key = None;
        copy.speech.api_key = None;
        copy.video.api_key = None;
        copy
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidya")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }
}
