//! HTTP client for the social scheduling service.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::SocialSettings;

use super::{SocialClient, SocialPostReceipt, SocialPostRequest};

/// Client for the social post scheduler
pub struct SchedulerClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SchedulerClient {
    pub fn new(settings: &SocialSettings) -> Self {
        Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SocialClient for SchedulerClient {
    async fn post(&self, request: &SocialPostRequest) -> Result<SocialPostReceipt> {
        let response = self
            .client
            .post(format!("{}/v1/posts", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .context("Failed to reach social scheduler")?
            .error_for_status()
            .with_context(|| format!("Scheduler rejected post for '{}'", request.platform))?;

        response
            .json()
            .await
            .context("Malformed scheduler response")
    }
}
