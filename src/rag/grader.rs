//! Relevance grading of retrieved passages.

use crate::config::Prompts;
use crate::conversation::Conversation;
use crate::error::Result;
use crate::llm::{ChatModel, ChatRequest};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Binary relevance verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    Relevant,
    Irrelevant,
}

impl Relevance {
    /// Parse the grader model's raw output.
    ///
    /// Only an exact `yes` (after trimming and lowercasing) is relevant.
    /// Anything else, including `"Yes please"` or an empty reply, is not.
    pub fn from_model_output(output: &str) -> Self {
        if output.trim().to_lowercase() == "yes" {
            Relevance::Relevant
        } else {
            Relevance::Irrelevant
        }
    }
}

/// Grades the latest retrieved content against the original question.
pub struct RelevanceGrader {
    model: Arc<dyn ChatModel>,
    model_name: String,
    temperature: f32,
    prompts: Arc<Prompts>,
}

impl RelevanceGrader {
    pub fn new(model: Arc<dyn ChatModel>, model_name: &str, prompts: Arc<Prompts>) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            temperature: 0.0,
            prompts,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[instrument(skip_all, fields(model = %self.model_name))]
    pub async fn grade(&self, conversation: &Conversation) -> Result<Relevance> {
        let prompt = self.prompts.render_with_custom(
            &self.prompts.grader,
            &[
                ("question", conversation.question()),
                ("context", &conversation.last().content),
            ],
        );

        let reply = self
            .model
            .complete(ChatRequest::prompt(&self.model_name, prompt, self.temperature))
            .await?;

        let relevance = Relevance::from_model_output(&reply.content);
        debug!("Grader replied {:?} -> {:?}", reply.content, relevance);
        Ok(relevance)
    }
}
