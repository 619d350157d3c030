//! HTTP clients for async media generation job APIs (audio and video).
//!
//! Both services share the same shape: create a job, then poll it until a
//! terminal state. The caller owns the polling cadence and deadline.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ServiceEndpoint, VideoProviderSettings};

use super::{AudioGenerator, AudioJobStatus, JobState, VideoGenerator, VideoJobStatus, VideoRequest};

/// Map a provider status string onto a JobState
fn parse_state(status: &str) -> JobState {
    match status {
        "queued" | "pending" => JobState::Queued,
        "ready" | "completed" | "done" => JobState::Ready,
        "failed" | "error" => JobState::Failed,
        _ => JobState::Processing,
    }
}

/// Client for the audio (text-to-speech) job API
pub struct AudioJobClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct AudioJobRequest<'a> {
    script: &'a str,
    title: &'a str,
}

#[derive(Deserialize)]
struct CreatedJob {
    job_id: String,
}

#[derive(Deserialize)]
struct AudioJobResponse {
    status: String,
    audio_url: Option<String>,
    error: Option<String>,
}

impl AudioJobClient {
    pub fn new(settings: &ServiceEndpoint) -> Self {
        Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AudioGenerator for AudioJobClient {
    async fn create_job(&self, script: &str, title: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/v1/jobs", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&AudioJobRequest { script, title })
            .send()
            .await
            .context("Failed to reach audio generation service")?
            .error_for_status()
            .context("Audio job creation rejected")?;

        let created: CreatedJob = response
            .json()
            .await
            .context("Malformed audio job response")?;

        Ok(created.job_id)
    }

    async fn poll_job(&self, job_id: &str) -> Result<AudioJobStatus> {
        let response = self
            .client
            .get(format!("{}/v1/jobs/{}", self.base_url, job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("Failed to poll audio job")?
            .error_for_status()
            .context("Audio job poll rejected")?;

        let body: AudioJobResponse = response
            .json()
            .await
            .context("Malformed audio job status")?;

        Ok(AudioJobStatus {
            state: parse_state(&body.status),
            audio_url: body.audio_url,
            error: body.error,
        })
    }
}

/// Client for one video generation provider in the fallback chain
pub struct VideoJobClient {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct VideoJobResponse {
    status: String,
    video_url: Option<String>,
    failed_reason: Option<String>,
}

impl VideoJobClient {
    pub fn new(settings: &VideoProviderSettings) -> Self {
        Self {
            name: settings.name.clone(),
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VideoGenerator for VideoJobClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_job(&self, request: &VideoRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/v1/jobs", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach video provider '{}'", self.name))?
            .error_for_status()
            .with_context(|| format!("Video provider '{}' rejected the job", self.name))?;

        let created: CreatedJob = response
            .json()
            .await
            .context("Malformed video job response")?;

        Ok(created.job_id)
    }

    async fn poll_job(&self, job_id: &str) -> Result<VideoJobStatus> {
        let response = self
            .client
            .get(format!("{}/v1/jobs/{}", self.base_url, job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to poll video provider '{}'", self.name))?
            .error_for_status()
            .context("Video job poll rejected")?;

        let body: VideoJobResponse = response
            .json()
            .await
            .context("Malformed video job status")?;

        Ok(VideoJobStatus {
            state: parse_state(&body.status),
            video_url: body.video_url,
            failed_reason: body.failed_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state() {
        assert_eq!(parse_state("queued"), JobState::Queued);
        assert_eq!(parse_state("completed"), JobState::Ready);
        assert_eq!(parse_state("error"), JobState::Failed);
        assert_eq!(parse_state("rendering"), JobState::Processing);
    }
}
