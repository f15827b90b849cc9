//! OpenAI chat completions backend.

use super::{ChatModel, ChatRequest, ModelReply, ToolSpec};
use crate::conversation::{Message, Role, ToolCallRequest};
use crate::error::{Result, VidyaError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model backed by the OpenAI API.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
}

impl OpenAIChatModel {
    /// Wrap an existing client. Build it once and share it.
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }

    fn convert_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
        let converted: ChatCompletionRequestMessage = match message.role {
            Role::Human => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| VidyaError::OpenAI(e.to_string()))?
                .into(),
            Role::Ai => {
                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !message.content.is_empty() {
                    args.content(message.content.clone());
                }
                if message.has_tool_calls() {
                    args.tool_calls(
                        message
                            .tool_calls
                            .iter()
                            .map(|call| ChatCompletionMessageToolCall {
                                id: call.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: call.name.clone(),
                                    arguments: call.arguments.clone(),
                                },
                            })
                            .collect::<Vec<_>>(),
                    );
                }
                args.build()
                    .map_err(|e| VidyaError::OpenAI(e.to_string()))?
                    .into()
            }
            Role::Tool => ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
                .content(message.content.clone())
                .build()
                .map_err(|e| VidyaError::OpenAI(e.to_string()))?
                .into(),
        };
        Ok(converted)
    }

    fn convert_tool(tool: &ToolSpec) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.parameters.clone()),
                strict: None,
            },
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete(&self, request: ChatRequest) -> Result<ModelReply> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system.as_ref().filter(|s| !s.is_empty()) {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.clone())
                    .build()
                    .map_err(|e| VidyaError::OpenAI(e.to_string()))?
                    .into(),
            );
        }
        for message in &request.messages {
            messages.push(Self::convert_message(message)?);
        }

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model)
            .messages(messages)
            .temperature(request.temperature);
        if !request.tools.is_empty() {
            args.tools(request.tools.iter().map(Self::convert_tool).collect::<Vec<_>>());
        }
        let api_request = args.build().map_err(|e| VidyaError::OpenAI(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| VidyaError::OpenAI(format!("Chat completion failed: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| VidyaError::OpenAI("No choices in response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect::<Vec<_>>();

        debug!("Model returned {} tool call(s)", tool_calls.len());

        Ok(ModelReply {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}
