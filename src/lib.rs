//! Vidya - textbook question answering with agentic retrieval
//!
//! Answers student questions about the NCERT sound chapter. A tool-calling
//! model decides whether to look a question up; retrieved passages are graded
//! for relevance, the question is rewritten when they miss, and the final
//! answer is generated from the passages. Answers can be enriched with
//! synthesized speech and a suggested YouTube video.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `conversation` - Message state threaded through the graph
//! - `llm` - Chat model abstraction (OpenAI backend)
//! - `embedding` - Query embedding
//! - `vector_store` - Passage index (SQLite, in-memory)
//! - `retrieval` - Retriever trait, vector retriever, JSONL import
//! - `agent` - Tool-calling router and the retriever tool
//! - `rag` - Grader, rewriter and generator nodes
//! - `orchestrator` - The state graph
//! - `enrichment` - Text-to-speech, topic extraction, video search
//! - `tutor` - Graph plus enrichment behind one call
//!
//! # Example
//!
//! ```rust,no_run
//! use vidya::config::Settings;
//! use vidya::tutor::Tutor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let tutor = Tutor::from_settings(&settings)?;
//!
//!     let response = tutor.answer("What is the speed of sound in air?").await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod embedding;
pub mod enrichment;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retrieval;
pub mod tutor;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, VidyaError};
