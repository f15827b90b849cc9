//! Single-call model nodes of the retrieval loop.
//!
//! Grading, rewriting and generation each render one prompt and make one
//! model call.

mod generator;
mod grader;
mod rewriter;

pub use generator::AnswerGenerator;
pub use grader::{Relevance, RelevanceGrader};
pub use rewriter::QueryRewriter;
