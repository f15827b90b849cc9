//! YouTube video suggestions through SerpApi.

use super::VideoSearch;
use crate::config::VideoSettings;
use crate::error::{Result, VidyaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// A suggested video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub link: String,
    /// Static thumbnail URL.
    pub thumbnail: String,
}

/// Pick the first video of a SerpApi YouTube response.
///
/// Returns `None` when there are no results or the first one lacks a title,
/// link or static thumbnail.
pub fn parse_video_results(response: &serde_json::Value) -> Option<VideoInfo> {
    let video = response.get("video_results")?.as_array()?.first()?;

    Some(VideoInfo {
        title: video.get("title")?.as_str()?.to_string(),
        link: video.get("link")?.as_str()?.to_string(),
        thumbnail: video.get("thumbnail")?.get("static")?.as_str()?.to_string(),
    })
}

/// SerpApi YouTube search.
pub struct SerpApiVideoSearch {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SerpApiVideoSearch {
    /// Build the client. Fails when no API key is configured.
    pub fn new(settings: &VideoSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| VidyaError::Config("SerpApi key not configured".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key,
        })
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("engine", "youtube"),
                ("search_query", query),
                ("api_key", self.api_key.as_str()),
            ],
        )
        .map_err(|e| VidyaError::Config(format!("Invalid video endpoint {}: {}", self.endpoint, e)))
    }
}

#[async_trait]
impl VideoSearch for SerpApiVideoSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Option<VideoInfo>> {
        let response: serde_json::Value = self
            .http
            .get(self.search_url(query)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let video = parse_video_results(&response);
        debug!("Video search found: {:?}", video.as_ref().map(|v| &v.title));
        Ok(video)
    }
}
