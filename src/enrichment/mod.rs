//! Optional answer enrichment: synthesized speech and a suggested video.
//!
//! Enrichment never fails a request. A disabled service, a network error or
//! an empty upstream response all come back as an absent field.

mod speech;
mod topics;
mod video;

pub use speech::SarvamSpeech;
pub use topics::TopicExtractor;
pub use video::{parse_video_results, SerpApiVideoSearch, VideoInfo};

use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::llm::ChatModel;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Trait for text-to-speech backends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Base64-encoded audio for `text`, or `None` if the service returned none.
    async fn synthesize(&self, text: &str) -> Result<Option<String>>;
}

/// Trait for video search backends.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Best matching video for `query`, if any.
    async fn search(&self, query: &str) -> Result<Option<VideoInfo>>;
}

/// Enrichment attached to an answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub audio_base64: Option<String>,
    pub suggested_video: Option<VideoInfo>,
}

/// Runs speech synthesis and the topic-to-video lookup side by side.
pub struct Enricher {
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    topics: Option<TopicExtractor>,
    video: Option<Arc<dyn VideoSearch>>,
    query_prefix: String,
}

impl Enricher {
    /// An enricher with every service switched off.
    pub fn disabled() -> Self {
        Self {
            speech: None,
            topics: None,
            video: None,
            query_prefix: String::new(),
        }
    }

    /// Build the configured services. Services that are disabled or missing
    /// an API key are left out.
    pub fn from_settings(settings: &Settings, model: Arc<dyn ChatModel>, prompts: Arc<Prompts>) -> Self {
        let mut enricher = Self::disabled().with_query_prefix(&settings.video.query_prefix);

        if settings.speech.enabled {
            match SarvamSpeech::new(&settings.speech) {
                Ok(speech) => enricher = enricher.with_speech(Arc::new(speech)),
                Err(e) => warn!("Speech synthesis disabled: {}", e),
            }
        }

        if settings.video.enabled {
            match SerpApiVideoSearch::new(&settings.video) {
                Ok(video) => {
                    enricher = enricher
                        .with_video(Arc::new(video))
                        .with_topics(TopicExtractor::new(model, &settings.llm.topics_model, prompts));
                }
                Err(e) => warn!("Video suggestions disabled: {}", e),
            }
        }

        enricher
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn with_topics(mut self, topics: TopicExtractor) -> Self {
        self.topics = Some(topics);
        self
    }

    pub fn with_video(mut self, video: Arc<dyn VideoSearch>) -> Self {
        self.video = Some(video);
        self
    }

    pub fn with_query_prefix(mut self, prefix: &str) -> Self {
        self.query_prefix = prefix.trim().to_string();
        self
    }

    /// Enrich an answer.
    #[instrument(skip_all)]
    pub async fn enrich(&self, answer: &str) -> Enrichment {
        let (audio_base64, suggested_video) =
            futures::future::join(self.audio(answer), self.video(answer)).await;

        Enrichment {
            audio_base64,
            suggested_video,
        }
    }

    async fn audio(&self, answer: &str) -> Option<String> {
        let speech = self.speech.as_ref()?;
        match speech.synthesize(answer).await {
            Ok(Some(audio)) => Some(audio),
            Ok(None) => {
                warn!("No audio data in speech response");
                None
            }
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                None
            }
        }
    }

    async fn video(&self, answer: &str) -> Option<VideoInfo> {
        let (topics, video) = (self.topics.as_ref()?, self.video.as_ref()?);

        let topics = match topics.extract(answer).await {
            Ok(Some(topics)) => topics,
            Ok(None) => {
                debug!("Answer is off-topic; skipping video search");
                return None;
            }
            Err(e) => {
                warn!("Topic extraction failed: {}", e);
                return None;
            }
        };

        let query = if self.query_prefix.is_empty() {
            topics
        } else {
            format!("{} {}", self.query_prefix, topics)
        };

        match video.search(&query).await {
            Ok(Some(found)) => {
                info!("Suggesting video: {}", found.title);
                Some(found)
            }
            Ok(None) => {
                debug!("No video results for {:?}", query);
                None
            }
            Err(e) => {
                warn!("Video search failed: {}", e);
                None
            }
        }
    }
}
