//! The retriever tool offered to the agent, and the node that executes it.

use crate::config::RetrievalSettings;
use crate::conversation::{Conversation, Message, ToolCallRequest};
use crate::error::{Result, VidyaError};
use crate::llm::ToolSpec;
use crate::retrieval::{format_documents, Retriever};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Arguments of the retriever tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetrieveArgs {
    pub query: String,
}

/// Retrieval exposed to the model as a callable tool.
pub struct RetrieverTool {
    retriever: Arc<dyn Retriever>,
    name: String,
    description: String,
}

impl RetrieverTool {
    pub fn new(retriever: Arc<dyn Retriever>, settings: &RetrievalSettings) -> Self {
        Self {
            retriever,
            name: settings.tool_name.clone(),
            description: settings.tool_description.clone(),
        }
    }

    /// Definition sent to the model.
    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "query to look up in retriever"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Validate a tool call against this tool.
    pub fn parse_call(&self, call: &ToolCallRequest) -> Result<RetrieveArgs> {
        if call.name != self.name {
            return Err(VidyaError::InvalidInput(format!("Unknown tool: {}", call.name)));
        }
        serde_json::from_str(&call.arguments)
            .map_err(|e| VidyaError::InvalidInput(format!("Invalid tool arguments: {}", e)))
    }

    /// Execute one call and produce its tool message.
    ///
    /// Malformed calls are reported back to the model as text; retriever
    /// failures are returned as errors.
    pub async fn execute(&self, call: &ToolCallRequest) -> Result<Message> {
        let args = match self.parse_call(call) {
            Ok(args) => args,
            Err(e) => {
                warn!("Rejected tool call {}: {}", call.name, e);
                return Ok(Message::tool(&call.id, format!("Failed to parse tool call: {}", e)));
            }
        };

        info!("Retrieving passages for: {}", args.query);
        let documents = self.retriever.search(&args.query).await?;

        let content = if documents.is_empty() {
            "No relevant passages found.".to_string()
        } else {
            format_documents(&documents)
        };
        Ok(Message::tool(&call.id, content))
    }

    /// Run every tool call of the last AI message, appending one tool message each.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<usize> {
        let calls = conversation.last().tool_calls.clone();
        if calls.is_empty() {
            return Err(VidyaError::Graph(
                "retrieve node reached without a pending tool call".to_string(),
            ));
        }

        for call in &calls {
            let message = self.execute(call).await?;
            conversation.push(message);
        }
        Ok(calls.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::testing::{tool_call, StaticRetriever};

    fn tool(retriever: Arc<StaticRetriever>) -> RetrieverTool {
        RetrieverTool::new(retriever, &RetrievalSettings::default())
    }

    #[test]
    fn test_spec_requires_query() {
        let spec = tool(Arc::new(StaticRetriever::new(&[]))).spec();
        assert_eq!(spec.name, "retrieve_textbook");
        assert_eq!(spec.parameters["required"][0], "query");
    }

    #[tokio::test]
    async fn test_execute_formats_documents() {
        let retriever = Arc::new(StaticRetriever::new(&["Sound is a wave.", "It needs a medium."]));
        let tool = tool(retriever.clone());

        let message = tool
            .execute(&tool_call("call_1", "retrieve_textbook", "sound"))
            .await
            .unwrap();

        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(message.content, "Sound is a wave.\n\nIt needs a medium.");
        assert_eq!(retriever.queries(), vec!["sound".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_tool_message() {
        let retriever = Arc::new(StaticRetriever::new(&["unused"]));
        let tool = tool(retriever.clone());

        let message = tool
            .execute(&tool_call("call_9", "web_search", "sound"))
            .await
            .unwrap();

        assert!(message.content.starts_with("Failed to parse tool call"));
        assert!(retriever.queries().is_empty());
    }

    #[tokio::test]
    async fn test_bad_arguments_become_tool_message() {
        let tool = tool(Arc::new(StaticRetriever::new(&["unused"])));
        let call = ToolCallRequest {
            id: "call_2".to_string(),
            name: "retrieve_textbook".to_string(),
            arguments: "{\"q\": 1}".to_string(),
        };

        let message = tool.execute(&call).await.unwrap();
        assert!(message.content.contains("Invalid tool arguments"));
    }

    #[tokio::test]
    async fn test_retriever_failure_propagates() {
        let tool = tool(Arc::new(StaticRetriever::failing()));
        let result = tool.execute(&tool_call("call_3", "retrieve_textbook", "echo")).await;
        assert!(matches!(result, Err(VidyaError::Retrieval(_))));
    }

    #[tokio::test]
    async fn test_empty_results_message() {
        let tool = tool(Arc::new(StaticRetriever::new(&[])));
        let message = tool
            .execute(&tool_call("call_4", "retrieve_textbook", "magnetism"))
            .await
            .unwrap();
        assert_eq!(message.content, "No relevant passages found.");
    }
}
