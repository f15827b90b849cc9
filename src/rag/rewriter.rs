//! Question rewriting after an irrelevant retrieval.

use crate::config::Prompts;
use crate::conversation::Conversation;
use crate::error::Result;
use crate::llm::{ChatModel, ChatRequest};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Reformulates the original question.
///
/// Only the first message is consulted; earlier rewrites and retrieved
/// content are ignored.
pub struct QueryRewriter {
    model: Arc<dyn ChatModel>,
    model_name: String,
    temperature: f32,
    prompts: Arc<Prompts>,
}

impl QueryRewriter {
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

    /// Append the rewritten question as a human message.
    ///
    /// A blank reply falls back to the original question so the rewrite
    /// still counts against the cap.
    #[instrument(skip_all, fields(model = %self.model_name, rewrites = conversation.rewrites()))]
    pub async fn rewrite(&self, conversation: &mut Conversation) -> Result<()> {
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.rewriter, &[("question", conversation.question())]);

        let reply = self
            .model
            .complete(ChatRequest::prompt(&self.model_name, prompt, self.temperature))
            .await?;

        let rewritten = match reply.content.trim() {
            "" => {
                warn!("Rewriter returned an empty question; reusing the original");
                conversation.question().to_string()
            }
            text => text.to_string(),
        };

        info!("Rewrote question as: {}", rewritten);
        conversation.push_rewrite(rewritten);
        Ok(())
    }
}
