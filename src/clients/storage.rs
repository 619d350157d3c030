//! HTTP client for the object storage relay.
//!
//! Generated media URLs from providers expire; the relay copies the file
//! into our own bucket and returns a durable URL.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::config::StorageSettings;

use super::{ObjectStorage, StoredObject};

/// Client for the storage transfer API
pub struct StorageRelayClient {
    base_url: String,
    api_key: String,
    bucket: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TransferRequest<'a> {
    source_url: &'a str,
    dest_path: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<&'a str>,
}

impl StorageRelayClient {
    pub fn new(settings: &StorageSettings) -> Self {
        Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            bucket: settings.bucket.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ObjectStorage for StorageRelayClient {
    async fn upload_from_url(&self, source_url: &str, dest_path: &str) -> Result<StoredObject> {
        let response = self
            .client
            .post(format!("{}/v1/transfers", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&TransferRequest {
                source_url,
                dest_path,
                bucket: self.bucket.as_deref(),
            })
            .send()
            .await
            .context("Failed to reach storage relay")?
            .error_for_status()
            .context("Storage relay rejected transfer")?;

        response
            .json()
            .await
            .context("Malformed storage relay response")
    }
}
