// src/clients/youtube.rs

use reqwest::Client;
use serde_json::Value;

use super::{UpstreamError, check_status};
use crate::config::ProviderConfig;

const SEARCH_RESULTS: &str = "12";

#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl YoutubeClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.youtube_base_url.trim_end_matches('/').to_string(),
            api_key: config.youtube_api_key.clone(),
        }
    }

    fn key(&self) -> Result<&str, UpstreamError> {
        self.api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("YOUTUBE_API_KEY"))
    }

    /// Video search ordered by relevance, Korean region.
    pub async fn search(&self, query: &str) -> Result<Value, UpstreamError> {
        let key = self.key()?;
        let url = format!("{}/search", self.base_url);
        tracing::debug!(query, "GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("key", key),
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", SEARCH_RESULTS),
                ("regionCode", "KR"),
                ("order", "relevance"),
            ])
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// Snippet and statistics of one video.
    pub async fn video(&self, video_id: &str) -> Result<Value, UpstreamError> {
        let key = self.key()?;
        let url = format!("{}/videos", self.base_url);
        tracing::debug!(video_id, "GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("id", video_id), ("key", key), ("part", "snippet,statistics")])
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}
