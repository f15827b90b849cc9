//! Text-to-speech through the Sarvam AI API.

use super::SpeechSynthesizer;
use crate::config::SpeechSettings;
use crate::error::{Result, VidyaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    inputs: [&'a str; 1],
    target_language_code: &'a str,
    speaker: &'a str,
    pitch: f32,
    pace: f32,
    loudness: f32,
    speech_sample_rate: u32,
    enable_preprocessing: bool,
    model: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct TtsResponse {
    #[serde(default)]
    audios: Vec<String>,
}

impl TtsResponse {
    fn first_audio(self) -> Option<String> {
        self.audios.into_iter().next().filter(|a| !a.is_empty())
    }
}

/// Sarvam AI speech synthesizer.
pub struct SarvamSpeech {
    http: reqwest::Client,
    api_key: String,
    settings: SpeechSettings,
}

impl SarvamSpeech {
    /// Build the client. Fails when no API key is configured.
    pub fn new(settings: &SpeechSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| VidyaError::Config("Sarvam API key not configured".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key,
            settings: settings.clone(),
        })
    }

    fn request_body<'a>(&'a self, text: &'a str) -> TtsRequest<'a> {
        TtsRequest {
            inputs: [text],
            target_language_code: &self.settings.target_language_code,
            speaker: &self.settings.speaker,
            pitch: self.settings.pitch,
            pace: self.settings.pace,
            loudness: self.settings.loudness,
            speech_sample_rate: self.settings.speech_sample_rate,
            enable_preprocessing: self.settings.enable_preprocessing,
            model: &self.settings.model,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for SarvamSpeech {
    #[instrument(skip_all, fields(chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Option<String>> {
        info!("Sending request to Sarvam TTS");

        let response = self
            .http
            .post(&self.settings.endpoint)
            .header("api-subscription-key", &self.api_key)
            .json(&self.request_body(text))
            .send()
            .await?
            .error_for_status()?;

        let body: TtsResponse = response.json().await?;
        Ok(body.first_audio())
    }
}
