//! Key-topic extraction used to build the video query.

use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatModel, ChatRequest};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Asks a model for the key topics of an answer.
pub struct TopicExtractor {
    model: Arc<dyn ChatModel>,
    model_name: String,
    prompts: Arc<Prompts>,
    list_marker: Regex,
}

impl TopicExtractor {
    pub fn new(model: Arc<dyn ChatModel>, model_name: &str, prompts: Arc<Prompts>) -> Self {
        // Leading "-", "*", "•" or "1." / "2)" on a list item
        let list_marker = Regex::new(r"^\s*(?:[-*•]+|\d+[.)])\s*").expect("Invalid regex");

        Self {
            model,
            model_name: model_name.to_string(),
            prompts,
            list_marker,
        }
    }

    /// Comma-separated topics, or `None` when the text is off-topic.
    #[instrument(skip_all, fields(model = %self.model_name))]
    pub async fn extract(&self, text: &str) -> Result<Option<String>> {
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.topics, &[("text", text)]);

        let reply = self
            .model
            .complete(ChatRequest::prompt(&self.model_name, prompt, 0.0))
            .await?;

        let topics = self.normalize(&reply.content);
        debug!("Extracted topics: {:?}", topics);
        Ok(topics)
    }

    /// Turn a raw reply into `a, b, c`.
    pub fn normalize(&self, reply: &str) -> Option<String> {
        let trimmed = reply.trim();
        let marker = self.prompts.unrelated_marker.trim();
        if trimmed.trim_end_matches('.').eq_ignore_ascii_case(marker) {
            return None;
        }

        let topics: Vec<String> = trimmed
            .lines()
            .flat_map(|line| line.split(','))
            .map(|item| self.list_marker.replace(item, "").trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();

        if topics.is_empty() {
            None
        } else {
            Some(topics.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    fn extractor(model: Arc<ScriptedModel>) -> TopicExtractor {
        TopicExtractor::new(model, "topics", Arc::new(Prompts::default()))
    }

    #[test]
    fn test_normalize() {
        let extractor = extractor(Arc::new(ScriptedModel::new()));

        assert_eq!(
            extractor.normalize("echo, reverberation, ultrasound").as_deref(),
            Some("echo, reverberation, ultrasound")
        );
        assert_eq!(
            extractor.normalize("1. Echo\n2) Pitch\n- Loudness\n").as_deref(),
            Some("Echo, Pitch, Loudness")
        );
        assert_eq!(extractor.normalize("Not related to sound chapter"), None);
        assert_eq!(extractor.normalize("  not related to sound chapter.\n"), None);
        assert_eq!(extractor.normalize("   "), None);
    }

    #[tokio::test]
    async fn test_extract_renders_text() {
        let model = Arc::new(ScriptedModel::new().on_text("topics", &["speed of sound, medium"]));
        let extractor = extractor(model.clone());

        let topics = extractor.extract("Sound travels at 344 m/s.").await.unwrap();
        assert_eq!(topics.as_deref(), Some("speed of sound, medium"));

        let prompt = &model.requests_for("topics")[0].messages[0].content;
        assert!(prompt.contains("Sound travels at 344 m/s."));
    }
}
