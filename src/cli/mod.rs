//! CLI module for Vidya.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Vidya - textbook question answering over a vector index
///
/// Answers questions about the NCERT sound chapter with an agentic retrieval
/// loop, optionally adding spoken audio and a suggested video.
#[derive(Parser, Debug)]
#[command(name = "vidya")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        /// Skip speech synthesis and video suggestions
        #[arg(long)]
        no_enrich: bool,

        /// Print the visited graph nodes
        #[arg(long)]
        trace: bool,
    },

    /// Search the passage index without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (defaults to retrieval.top_k)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score (defaults to retrieval.min_score)
        #[arg(short, long)]
        min_score: Option<f32>,
    },

    /// Import pre-embedded passages from a JSON Lines file
    Import {
        /// Path to the .jsonl file
        file: String,

        /// Source name for records without a `source` field (defaults to the file name)
        #[arg(short, long)]
        source: Option<String>,

        /// Delete existing passages of the imported sources first
        #[arg(long)]
        replace: bool,
    },

    /// List indexed sources
    Sources,

    /// Check API keys, index and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (API keys hidden)
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
