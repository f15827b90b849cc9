//! Final answer generation from retrieved context.

use crate::config::Prompts;
use crate::conversation::{Conversation, Message};
use crate::error::Result;
use crate::llm::{ChatModel, ChatRequest};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Writes the answer from the original question and the latest retrieved content.
pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
    model_name: String,
    temperature: f32,
    prompts: Arc<Prompts>,
}

impl AnswerGenerator {
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

    /// Append the answer as the terminal AI message.
    #[instrument(skip_all, fields(model = %self.model_name))]
    pub async fn generate(&self, conversation: &mut Conversation) -> Result<()> {
        let prompt = self.prompts.render_with_custom(
            &self.prompts.generator,
            &[
                ("question", conversation.question()),
                ("context", &conversation.last().content),
            ],
        );

        let reply = self
            .model
            .complete(ChatRequest::prompt(&self.model_name, prompt, self.temperature))
            .await?;

        debug!("Generated answer of {} chars", reply.content.len());
        conversation.push(Message::ai(reply.content));
        Ok(())
    }
}
