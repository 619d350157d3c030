//! REST client for CMS destinations.
//!
//! Credentials (endpoint + key) are passed per call, so a single client
//! serves both the primary and secondary publishing destinations.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::config::CmsCredentials;

use super::{CmsClient, CreatedPost, NewPost, PostPatch, RemotePost, UploadedMedia};

/// Generic JSON-over-REST CMS client
pub struct RestCmsClient {
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MediaUploadRequest<'a> {
    source_url: &'a str,
    filename: &'a str,
}

impl RestCmsClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn posts_url(creds: &CmsCredentials) -> String {
        format!("{}/posts", creds.endpoint.trim_end_matches('/'))
    }
}

impl Default for RestCmsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CmsClient for RestCmsClient {
    async fn create_post(&self, creds: &CmsCredentials, post: &NewPost) -> Result<CreatedPost> {
        let response = self
            .client
            .post(Self::posts_url(creds))
            .bearer_auth(&creds.api_key)
            .json(post)
            .send()
            .await
            .context("Failed to reach CMS")?
            .error_for_status()
            .context("CMS rejected post creation")?;

        response.json().await.context("Malformed CMS post response")
    }

    async fn update_post(&self, creds: &CmsCredentials, id: &str, patch: &PostPatch) -> Result<()> {
        self.client
            .patch(format!("{}/{}", Self::posts_url(creds), id))
            .bearer_auth(&creds.api_key)
            .json(patch)
            .send()
            .await
            .context("Failed to reach CMS")?
            .error_for_status()
            .context("CMS rejected post update")?;

        Ok(())
    }

    async fn get_post(&self, creds: &CmsCredentials, id: &str) -> Result<RemotePost> {
        let response = self
            .client
            .get(format!("{}/{}", Self::posts_url(creds), id))
            .bearer_auth(&creds.api_key)
            .send()
            .await
            .context("Failed to reach CMS")?
            .error_for_status()
            .context("CMS post fetch rejected")?;

        response.json().await.context("Malformed CMS post body")
    }

    async fn upload_media(
        &self,
        creds: &CmsCredentials,
        source_url: &str,
        filename: &str,
    ) -> Result<UploadedMedia> {
        let response = self
            .client
            .post(format!("{}/media", creds.endpoint.trim_end_matches('/')))
            .bearer_auth(&creds.api_key)
            .json(&MediaUploadRequest {
                source_url,
                filename,
            })
            .send()
            .await
            .context("Failed to reach CMS media endpoint")?
            .error_for_status()
            .context("CMS rejected media upload")?;

        response
            .json()
            .await
            .context("Malformed CMS media response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posts_url_trims_trailing_slash() {
        let creds = CmsCredentials {
            endpoint: "https://cms.example.com/api/".to_string(),
            api_key: "key".to_string(),
            site_id: None,
        };

        assert_eq!(
            RestCmsClient::posts_url(&creds),
            "https://cms.example.com/api/posts"
        );
    }
}
