//! HTTP client for the podcast host.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::config::PodcastSettings;

use super::{EpisodeDraft, PodcastHost, PublishedEpisode};

/// Client for the podcast hosting API
pub struct PodcastClient {
    base_url: String,
    api_key: String,
    show_id: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EpisodeRequest<'a> {
    title: &'a str,
    description: &'a str,
    audio_url: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    show_id: Option<&'a str>,
}

impl PodcastClient {
    pub fn new(settings: &PodcastSettings) -> Self {
        Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            show_id: settings.show_id.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PodcastHost for PodcastClient {
    async fn publish(&self, episode: &EpisodeDraft) -> Result<PublishedEpisode> {
        let response = self
            .client
            .post(format!("{}/v1/episodes", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EpisodeRequest {
                title: &episode.title,
                description: &episode.description,
                audio_url: &episode.audio_url,
                show_id: self.show_id.as_deref(),
            })
            .send()
            .await
            .context("Failed to reach podcast host")?
            .error_for_status()
            .context("Podcast host rejected episode")?;

        response
            .json()
            .await
            .context("Malformed podcast host response")
    }
}
