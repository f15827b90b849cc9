//! Conversation state threaded through the state graph.
//!
//! A conversation lives for one request. Messages are appended, never edited,
//! and the first message is always the user's original question.

use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user, or a rewritten question standing in for the user.
    Human,
    /// Model output.
    Ai,
    /// Output of a tool invocation.
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned call id, echoed back by the tool message.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool calls requested by an AI message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Call id a tool message responds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// An AI message that requests tool calls.
    pub fn ai_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls,
            ..Self::ai(content)
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Append-only message sequence for one request.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    rewrites: u32,
}

impl Conversation {
    /// Start a conversation from the user's question.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::human(question)],
            rewrites: 0,
        }
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The original question.
    pub fn question(&self) -> &str {
        &self.messages[0].content
    }

    /// The most recent message.
    pub fn last(&self) -> &Message {
        // never empty: `new` seeds the question
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of rewrite cycles performed so far.
    pub fn rewrites(&self) -> u32 {
        self.rewrites
    }

    /// Append a rewritten question and count the cycle.
    pub fn push_rewrite(&mut self, question: impl Into<String>) {
        self.rewrites += 1;
        self.push(Message::human(question));
    }
}
