//! Agent node: lets the tool-bound model decide whether to retrieve.

use crate::conversation::Conversation;
use crate::error::Result;
use crate::llm::{ChatModel, ChatRequest, ModelReply, ToolSpec};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Where the graph goes after the agent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRoute {
    /// The model asked for a tool call.
    Tools,
    /// The model answered directly.
    End,
}

impl AgentRoute {
    /// Any tool call routes to the retriever; a plain reply ends the run.
    pub fn from_reply(reply: &ModelReply) -> Self {
        if reply.tool_calls.is_empty() {
            AgentRoute::End
        } else {
            AgentRoute::Tools
        }
    }
}

/// Invokes the tool-bound model over the whole conversation.
pub struct AgentRouter {
    model: Arc<dyn ChatModel>,
    model_name: String,
    system_prompt: Option<String>,
    temperature: f32,
    tool: ToolSpec,
}

impl AgentRouter {
    pub fn new(model: Arc<dyn ChatModel>, model_name: &str, tool: ToolSpec) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            system_prompt: None,
            temperature: 0.0,
            tool,
        }
    }

    /// Set a system prompt. Empty strings are ignored.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = Some(prompt.to_string()).filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Call the model, append its reply and report the route.
    #[instrument(skip_all, fields(model = %self.model_name, messages = conversation.len()))]
    pub async fn route(&self, conversation: &mut Conversation) -> Result<AgentRoute> {
        let request = ChatRequest {
            model: self.model_name.clone(),
            system: self.system_prompt.clone(),
            messages: conversation.messages().to_vec(),
            temperature: self.temperature,
            tools: vec![self.tool.clone()],
        };

        let reply = self.model.complete(request).await?;
        let route = AgentRoute::from_reply(&reply);
        debug!("Agent chose {:?}", route);

        conversation.push(reply.into_message());
        Ok(route)
    }
}
