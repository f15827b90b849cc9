//! Language model abstraction.
//!
//! Graph nodes talk to a [`ChatModel`] instead of a vendor SDK so the same
//! control flow runs against OpenAI in production and scripted models in tests.

mod openai;

pub use openai::OpenAIChatModel;

use crate::conversation::{Message, ToolCallRequest};
use crate::error::Result;
use async_trait::async_trait;

/// A function the model may ask to call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// A chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Optional system instructions, sent before `messages`.
    pub system: Option<String>,
    /// Ordered conversation messages.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Tools bound to this call. Empty means plain completion.
    pub tools: Vec<ToolSpec>,
}

impl ChatRequest {
    /// A single-prompt request with no tools, as used by grading and rewriting.
    pub fn prompt(model: &str, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            system: None,
            messages: vec![Message::human(prompt)],
            temperature,
            tools: Vec::new(),
        }
    }
}

/// A model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    /// Text content (may be empty when only tool calls are returned).
    pub content: String,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Convert into a conversation message, keeping any tool calls.
    pub fn into_message(self) -> Message {
        Message::ai_with_tool_calls(self.content, self.tool_calls)
    }
}

/// Trait for chat model backends.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one chat completion.
    async fn complete(&self, request: ChatRequest) -> Result<ModelReply>;
}
