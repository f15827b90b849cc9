//! The retrieval state graph.
//!
//! ```text
//! Agent --tool call--> Retrieve --relevant--> Generate --> End
//!   |                     |
//!   +--no tool call--> End +--irrelevant--> Rewrite --> Agent
//! ```
//!
//! Rewrites are capped at `max_rewrites`. Once the cap is reached an
//! irrelevant grade goes to Generate anyway and the outcome is marked forced.

use crate::agent::{AgentRoute, AgentRouter, RetrieverTool};
use crate::config::{Prompts, Settings};
use crate::conversation::Conversation;
use crate::error::Result;
use crate::llm::ChatModel;
use crate::rag::{AnswerGenerator, QueryRewriter, Relevance, RelevanceGrader};
use crate::retrieval::Retriever;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A node of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Agent,
    Retrieve,
    Rewrite,
    Generate,
    End,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Node::Agent => "agent",
            Node::Retrieve => "retrieve",
            Node::Rewrite => "rewrite",
            Node::Generate => "generate",
            Node::End => "end",
        };
        f.write_str(name)
    }
}

/// Result of one graph run.
#[derive(Debug, Clone)]
pub struct GraphOutcome {
    /// Content of the final message.
    pub answer: String,
    pub conversation: Conversation,
    /// Nodes visited, ending with [`Node::End`].
    pub path: Vec<Node>,
    pub rewrites: u32,
    /// Generated after the rewrite cap despite an irrelevant grade.
    pub forced: bool,
}

/// Agent, retrieve, grade, rewrite and generate wired into one loop.
pub struct RagGraph {
    router: AgentRouter,
    tool: RetrieverTool,
    grader: RelevanceGrader,
    rewriter: QueryRewriter,
    generator: AnswerGenerator,
    max_rewrites: u32,
}

impl RagGraph {
    /// Assemble a graph from prebuilt nodes.
    pub fn new(
        router: AgentRouter,
        tool: RetrieverTool,
        grader: RelevanceGrader,
        rewriter: QueryRewriter,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            router,
            tool,
            grader,
            rewriter,
            generator,
            max_rewrites: 3,
        }
    }

    /// Build every node from settings around shared clients.
    pub fn from_settings(
        settings: &Settings,
        prompts: Arc<Prompts>,
        model: Arc<dyn ChatModel>,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        let llm = &settings.llm;
        let tool = RetrieverTool::new(retriever, &settings.retrieval);

        let router = AgentRouter::new(model.clone(), &llm.agent_model, tool.spec())
            .with_system_prompt(&prompts.agent)
            .with_temperature(llm.temperature);
        let grader = RelevanceGrader::new(model.clone(), &llm.grader_model, prompts.clone())
            .with_temperature(llm.temperature);
        let rewriter = QueryRewriter::new(model.clone(), &llm.rewriter_model, prompts.clone())
            .with_temperature(llm.temperature);
        let generator = AnswerGenerator::new(model, &llm.generator_model, prompts)
            .with_temperature(llm.temperature);

        Self::new(router, tool, grader, rewriter, generator)
            .with_max_rewrites(settings.graph.max_rewrites)
    }

    pub fn with_max_rewrites(mut self, max_rewrites: u32) -> Self {
        self.max_rewrites = max_rewrites;
        self
    }

    /// Run the graph for one question.
    #[instrument(skip(self), fields(max_rewrites = self.max_rewrites))]
    pub async fn run(&self, question: &str) -> Result<GraphOutcome> {
        let mut conversation = Conversation::new(question);
        let mut path = Vec::new();
        let mut forced = false;
        let mut node = Node::Agent;

        loop {
            path.push(node);
            debug!("Entering node {}", node);

            node = match node {
                Node::Agent => match self.router.route(&mut conversation).await? {
                    AgentRoute::Tools => Node::Retrieve,
                    AgentRoute::End => Node::End,
                },
                Node::Retrieve => {
                    self.tool.run(&mut conversation).await?;
                    match self.grader.grade(&conversation).await? {
                        Relevance::Relevant => Node::Generate,
                        Relevance::Irrelevant if conversation.rewrites() < self.max_rewrites => {
                            Node::Rewrite
                        }
                        Relevance::Irrelevant => {
                            warn!(
                                "No relevant passages after {} rewrites; generating anyway",
                                conversation.rewrites()
                            );
                            forced = true;
                            Node::Generate
                        }
                    }
                }
                Node::Rewrite => {
                    self.rewriter.rewrite(&mut conversation).await?;
                    Node::Agent
                }
                Node::Generate => {
                    self.generator.generate(&mut conversation).await?;
                    Node::End
                }
                Node::End => break,
            };
        }

        info!("Graph finished after {} nodes, {} rewrites", path.len(), conversation.rewrites());

        Ok(GraphOutcome {
            answer: conversation.last().content.clone(),
            rewrites: conversation.rewrites(),
            conversation,
            path,
            forced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VidyaError;
    use crate::testing::{ScriptedModel, StaticRetriever};
    use tokio_test::assert_ok;

    const PASSAGE: &str = "The speed of sound in air is 344 m/s at 22 C.";

    fn settings(max_rewrites: u32) -> Settings {
        let mut settings = Settings::default();
        settings.llm.agent_model = "agent".to_string();
        settings.llm.grader_model = "grader".to_string();
        settings.llm.rewriter_model = "rewriter".to_string();
        settings.llm.generator_model = "generator".to_string();
        settings.graph.max_rewrites = max_rewrites;
        settings
    }

    fn graph(model: Arc<ScriptedModel>, retriever: Arc<StaticRetriever>, max_rewrites: u32) -> RagGraph {
        RagGraph::from_settings(&settings(max_rewrites), Arc::new(Prompts::default()), model, retriever)
    }

    #[tokio::test]
    async fn test_relevant_on_first_try() {
        let model = Arc::new(
            ScriptedModel::new()
                .on_tool_call("agent", "speed of sound in air")
                .on_text("grader", &["yes"])
                .on_text("generator", &["About 344 m/s."]),
        );
        let retriever = Arc::new(StaticRetriever::new(&[PASSAGE]));

        let outcome = graph(model.clone(), retriever.clone(), 3)
            .run("What is the speed of sound in air?")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "About 344 m/s.");
        assert_eq!(outcome.path, vec![Node::Agent, Node::Retrieve, Node::Generate, Node::End]);
        assert_eq!(outcome.rewrites, 0);
        assert!(!outcome.forced);
        assert_eq!(model.calls_for("rewriter"), 0);
        assert_eq!(retriever.queries(), vec!["speed of sound in air".to_string()]);
    }

    #[tokio::test]
    async fn test_rewrite_loop_is_capped() {
        let model = Arc::new(
            ScriptedModel::new()
                .on_tool_call("agent", "sound")
                .on_text("grader", &["no"])
                .on_text("rewriter", &["What is sound?"])
                .on_text("generator", &["I don't know."]),
        );
        let retriever = Arc::new(StaticRetriever::new(&["Light travels fast."]));

        let outcome = graph(model.clone(), retriever.clone(), 2)
            .run("sound?")
            .await
            .unwrap();

        assert_eq!(outcome.rewrites, 2);
        assert!(outcome.forced);
        assert_eq!(outcome.answer, "I don't know.");
        assert_eq!(model.calls_for("rewriter"), 2);
        assert_eq!(model.calls_for("grader"), 3);
        assert_eq!(retriever.queries().len(), 3);
        assert_eq!(
            outcome.path,
            vec![
                Node::Agent,
                Node::Retrieve,
                Node::Rewrite,
                Node::Agent,
                Node::Retrieve,
                Node::Rewrite,
                Node::Agent,
                Node::Retrieve,
                Node::Generate,
                Node::End,
            ]
        );
    }

    #[tokio::test]
    async fn test_relevant_after_one_rewrite() {
        let model = Arc::new(
            ScriptedModel::new()
                .on_tool_call("agent", "echo")
                .on_text("grader", &["no", " Yes\n"])
                .on_text("rewriter", &["What causes an echo?"])
                .on_text("generator", &["Reflection of sound."]),
        );
        let retriever = Arc::new(StaticRetriever::new(&["An echo is reflected sound."]));

        let outcome = assert_ok!(graph(model, retriever, 3).run("echo").await);

        assert_eq!(outcome.rewrites, 1);
        assert!(!outcome.forced);
        assert_eq!(outcome.answer, "Reflection of sound.");
        assert_eq!(outcome.conversation.question(), "echo");
    }

    #[tokio::test]
    async fn test_blank_rewrite_still_finishes() {
        let model = Arc::new(
            ScriptedModel::new()
                .on_tool_call("agent", "echo")
                .on_text("grader", &["no", "yes"])
                .on_text("rewriter", &[""])
                .on_text("generator", &["Reflection of sound."]),
        );
        let retriever = Arc::new(StaticRetriever::new(&["An echo is reflected sound."]));

        let outcome = assert_ok!(graph(model.clone(), retriever, 3).run("What is an echo?").await);

        assert_eq!(outcome.answer, "Reflection of sound.");
        assert_eq!(outcome.rewrites, 1);
        assert!(!outcome.forced);
        assert_eq!(model.calls_for("rewriter"), 1);
        let rewritten = outcome
            .conversation
            .messages()
            .iter()
            .filter(|m| m.content == "What is an echo?")
            .count();
        assert_eq!(rewritten, 2);
    }

    #[tokio::test]
    async fn test_no_tool_call_ends_with_agent_reply() {
        let model = Arc::new(ScriptedModel::new().on_text("agent", &["Hello! Ask me about sound."]));
        let retriever = Arc::new(StaticRetriever::new(&[PASSAGE]));

        let outcome = graph(model.clone(), retriever.clone(), 3).run("hi").await.unwrap();

        assert_eq!(outcome.answer, "Hello! Ask me about sound.");
        assert_eq!(outcome.path, vec![Node::Agent, Node::End]);
        assert!(retriever.queries().is_empty());
        assert_eq!(model.calls_for("grader"), 0);
    }

    #[tokio::test]
    async fn test_zero_rewrites_generates_immediately() {
        let model = Arc::new(
            ScriptedModel::new()
                .on_tool_call("agent", "sound")
                .on_text("grader", &["no"])
                .on_text("generator", &["Best effort."]),
        );
        let outcome = graph(model.clone(), Arc::new(StaticRetriever::new(&["x"])), 0)
            .run("sound?")
            .await
            .unwrap();

        assert!(outcome.forced);
        assert_eq!(model.calls_for("rewriter"), 0);
    }

    #[tokio::test]
    async fn test_same_question_same_answer() {
        let model = Arc::new(
            ScriptedModel::new()
                .on_tool_call("agent", "pitch")
                .on_text("grader", &["yes"])
                .on_text("generator", &["Pitch depends on frequency."]),
        );
        let graph = graph(model, Arc::new(StaticRetriever::new(&[PASSAGE])), 3);

        let first = graph.run("What decides pitch?").await.unwrap();
        let second = graph.run("What decides pitch?").await.unwrap();
        assert_eq!(first.answer, second.answer);
        assert_eq!(first.path, second.path);
    }

    #[tokio::test]
    async fn test_failures_propagate() {
        let model = Arc::new(
            ScriptedModel::new()
                .on_tool_call("agent", "sound")
                .failing("grader"),
        );
        let result = graph(model, Arc::new(StaticRetriever::new(&[PASSAGE])), 3)
            .run("sound?")
            .await;
        assert!(matches!(result, Err(VidyaError::OpenAI(_))));

        let model = Arc::new(ScriptedModel::new().on_tool_call("agent", "sound"));
        let result = graph(model, Arc::new(StaticRetriever::failing()), 3)
            .run("sound?")
            .await;
        assert!(matches!(result, Err(VidyaError::Retrieval(_))));
    }
}
