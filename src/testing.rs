//! Deterministic stand-ins for the network-backed collaborators.

use crate::config::{Prompts, Settings};
use crate::conversation::ToolCallRequest;
use crate::embedding::Embedder;
use crate::enrichment::{Enricher, SpeechSynthesizer, VideoInfo, VideoSearch};
use crate::error::{Result, VidyaError};
use crate::llm::{ChatModel, ChatRequest, ModelReply};
use crate::orchestrator::RagGraph;
use crate::retrieval::{RetrievedDocument, Retriever};
use crate::tutor::Tutor;
use crate::vector_store::Metadata;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A tool call to the retriever tool with `{"query": query}`.
pub fn tool_call(id: &str, name: &str, query: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments: serde_json::json!({ "query": query }).to_string(),
    }
}

pub fn sample_video() -> VideoInfo {
    VideoInfo {
        title: "Sound | Class 9 Science".to_string(),
        link: "https://www.youtube.com/watch?v=sound09".to_string(),
        thumbnail: "https://i.ytimg.com/vi/sound09/hqdefault.jpg".to_string(),
    }
}

enum Scripted {
    Reply(ModelReply),
    Fail,
}

/// Chat model with canned replies per model name.
///
/// Replies are consumed in order and the last one repeats. Every request is
/// recorded.
#[derive(Default)]
pub struct ScriptedModel {
    scripts: Mutex<HashMap<String, Vec<Scripted>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, model: &str, entry: Scripted) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push(entry);
        self
    }

    pub fn on_text(mut self, model: &str, replies: &[&str]) -> Self {
        for reply in replies {
            self = self.push(model, Scripted::Reply(ModelReply::text(*reply)));
        }
        self
    }

    /// Reply with one retriever tool call for `query`.
    pub fn on_tool_call(self, model: &str, query: &str) -> Self {
        let reply = ModelReply {
            content: String::new(),
            tool_calls: vec![tool_call("call_1", "retrieve_textbook", query)],
        };
        self.push(model, Scripted::Reply(reply))
    }

    pub fn failing(self, model: &str) -> Self {
        self.push(model, Scripted::Fail)
    }

    pub fn requests_for(&self, model: &str) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.model == model)
            .cloned()
            .collect()
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.requests_for(model).len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: ChatRequest) -> Result<ModelReply> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);

        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(&model)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VidyaError::OpenAI(format!("no script for model {}", model)))?;

        let entry = if script.len() > 1 {
            script.remove(0)
        } else {
            match &script[0] {
                Scripted::Reply(reply) => Scripted::Reply(reply.clone()),
                Scripted::Fail => Scripted::Fail,
            }
        };

        match entry {
            Scripted::Reply(reply) => Ok(reply),
            Scripted::Fail => Err(VidyaError::OpenAI(format!("{} is unavailable", model))),
        }
    }
}

/// Retriever returning the same passages for every query.
pub struct StaticRetriever {
    texts: Vec<String>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl StaticRetriever {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn search(&self, query: &str) -> Result<Vec<RetrievedDocument>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(VidyaError::Retrieval("index unavailable".to_string()));
        }

        Ok(self
            .texts
            .iter()
            .map(|text| RetrievedDocument {
                text: text.clone(),
                metadata: Metadata::new(),
                score: 1.0,
            })
            .collect())
    }
}

/// Embedder whose dimensions count keyword occurrences.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .map(|k| text.matches(k.as_str()).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }
}

pub struct StaticSpeech {
    audio: Option<String>,
    fail: bool,
}

impl StaticSpeech {
    pub fn new(audio: Option<&str>) -> Self {
        Self {
            audio: audio.map(str::to_string),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            audio: None,
            fail: true,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for StaticSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Option<String>> {
        if self.fail {
            return Err(VidyaError::Enrichment("tts unavailable".to_string()));
        }
        Ok(self.audio.clone())
    }
}

pub struct StaticVideoSearch {
    video: Option<VideoInfo>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl StaticVideoSearch {
    pub fn new(video: Option<VideoInfo>) -> Self {
        Self {
            video,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(None)
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSearch for StaticVideoSearch {
    async fn search(&self, query: &str) -> Result<Option<VideoInfo>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(VidyaError::Enrichment("search unavailable".to_string()));
        }
        Ok(self.video.clone())
    }
}

/// A tutor whose graph retrieves one relevant passage about the speed of
/// sound and answers from it.
pub fn stub_tutor(enricher: Enricher) -> Tutor {
    let mut settings = Settings::default();
    settings.llm.agent_model = "agent".to_string();
    settings.llm.grader_model = "grader".to_string();
    settings.llm.generator_model = "generator".to_string();

    let model = Arc::new(
        ScriptedModel::new()
            .on_tool_call("agent", "speed of sound in air")
            .on_text("grader", &["yes"])
            .on_text("generator", &["Sound travels at about 344 m/s in air."]),
    );
    let retriever: Arc<dyn Retriever> =
        Arc::new(StaticRetriever::new(&["The speed of sound in air is 344 m/s at 22 C."]));
    let graph = RagGraph::from_settings(&settings, Arc::new(Prompts::default()), model, retriever);

    Tutor::with_components(graph, enricher)
}

/// A tutor whose model is down.
pub fn failing_tutor() -> Tutor {
    let mut settings = Settings::default();
    settings.llm.agent_model = "agent".to_string();

    let model = Arc::new(ScriptedModel::new().failing("agent"));
    let retriever: Arc<dyn Retriever> = Arc::new(StaticRetriever::new(&[]));
    let graph = RagGraph::from_settings(&settings, Arc::new(Prompts::default()), model, retriever);

    Tutor::with_components(graph, Enricher::disabled())
}
