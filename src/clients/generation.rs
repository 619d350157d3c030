//! HTTP client for the content generation service.
//!
//! One service generates both article text and images; the two traits are
//! implemented on the same client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::config::{BusinessProfile, GenerationSettings};
use crate::domain::ImageAspect;

use super::{GeneratedArticle, GeneratedImage, ImageGenerator, TextGenerator};

/// Client for the article/image generation API
pub struct GenerationClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ArticleRequest<'a> {
    business: &'a BusinessProfile,
    topic: &'a str,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    business: &'a BusinessProfile,
    topic: &'a str,
    aspect: &'a str,
}

impl GenerationClient {
    pub fn new(settings: &GenerationSettings) -> Self {
        Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, profile: &BusinessProfile, topic: &str) -> Result<GeneratedArticle> {
        let response = self
            .client
            .post(self.api_url("v1/articles"))
            .bearer_auth(&self.api_key)
            .json(&ArticleRequest {
                business: profile,
                topic,
            })
            .send()
            .await
            .context("Failed to reach article generation service")?
            .error_for_status()
            .context("Article generation request rejected")?;

        response
            .json()
            .await
            .context("Malformed article generation response")
    }
}

#[async_trait]
impl ImageGenerator for GenerationClient {
    async fn generate(
        &self,
        profile: &BusinessProfile,
        topic: &str,
        aspect: ImageAspect,
    ) -> Result<GeneratedImage> {
        let response = self
            .client
            .post(self.api_url("v1/images"))
            .bearer_auth(&self.api_key)
            .json(&ImageRequest {
                business: profile,
                topic,
                aspect: aspect.as_str(),
            })
            .send()
            .await
            .context("Failed to reach image generation service")?
            .error_for_status()
            .context("Image generation request rejected")?;

        response
            .json()
            .await
            .context("Malformed image generation response")
    }
}
