//! Collaborator interfaces for external services.
//!
//! The pipeline depends only on these narrow contracts: content and media
//! generators, publishing destinations, and object storage. Concrete
//! reqwest-backed clients live in the submodules; tests substitute stubs.

pub mod cms;
pub mod generation;
pub mod media;
pub mod podcast;
pub mod social;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{BusinessProfile, CmsCredentials};
use crate::domain::ImageAspect;

pub use cms::RestCmsClient;
pub use generation::GenerationClient;
pub use media::{AudioJobClient, VideoJobClient};
pub use podcast::PodcastClient;
pub use social::SchedulerClient;
pub use storage::StorageRelayClient;

/// Generated article text and metadata, as returned by the text generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub slug: String,
    pub body_html: String,
    pub excerpt: String,
    pub meta_title: String,
    pub meta_description: String,
}

/// One generated image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Terminal and non-terminal states of an async provider job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    Ready,
    Failed,
}

/// Poll result for an audio generation job
#[derive(Debug, Clone)]
pub struct AudioJobStatus {
    pub state: JobState,
    pub audio_url: Option<String>,
    pub error: Option<String>,
}

/// Poll result for a video generation job
#[derive(Debug, Clone)]
pub struct VideoJobStatus {
    pub state: JobState,
    pub video_url: Option<String>,
    pub failed_reason: Option<String>,
}

/// Request for a short video
#[derive(Debug, Clone, Serialize)]
pub struct VideoRequest {
    pub title: String,
    pub script: String,

    /// Source image to animate, if one was generated
    pub source_url: Option<String>,
}

/// New post payload for a CMS destination
#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub meta_title: String,
    pub meta_description: String,

    /// CMS media id of the hero image, if uploaded
    pub hero_media_id: Option<String>,
}

/// Partial update for an existing CMS post
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A post as read back from the CMS
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePost {
    pub content: String,
}

/// Result of creating a CMS post
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPost {
    pub id: String,
    pub url: String,
}

/// Result of a CMS media upload
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMedia {
    pub id: String,
}

/// Result of an object storage transfer
#[derive(Debug, Clone, Deserialize)]
pub struct StoredObject {
    pub url: String,
}

/// One social post to schedule or publish immediately
#[derive(Debug, Clone, Serialize)]
pub struct SocialPostRequest {
    pub account_id: String,
    pub platform: String,
    pub caption: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,

    /// Post immediately when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// Receipt from the social scheduling service
#[derive(Debug, Clone, Deserialize)]
pub struct SocialPostReceipt {
    pub post_id: String,
    pub status: String,
    pub published_url: Option<String>,
    pub error: Option<String>,
}

/// A podcast episode ready to publish
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeDraft {
    pub title: String,
    pub description: String,
    pub audio_url: String,
}

/// A published podcast episode
#[derive(Debug, Clone, Deserialize)]
pub struct PublishedEpisode {
    pub episode_id: String,
    pub url: String,
    pub player_url: String,
}

/// Article text generator
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, profile: &BusinessProfile, topic: &str) -> Result<GeneratedArticle>;
}

/// Image generator, one call per aspect ratio
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        profile: &BusinessProfile,
        topic: &str,
        aspect: ImageAspect,
    ) -> Result<GeneratedImage>;
}

/// Async audio generation job API
#[async_trait]
pub trait AudioGenerator: Send + Sync {
    async fn create_job(&self, script: &str, title: &str) -> Result<String>;

    async fn poll_job(&self, job_id: &str) -> Result<AudioJobStatus>;
}

/// Async video generation job API
///
/// Implementations form an ordered fallback chain: the stage tries each
/// provider's `create_job` in turn until one accepts.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Provider name, recorded on the artifact for re-attachment
    fn name(&self) -> &str;

    async fn create_job(&self, request: &VideoRequest) -> Result<String>;

    async fn poll_job(&self, job_id: &str) -> Result<VideoJobStatus>;
}

/// CMS destination; credentials are passed per call so one client can
/// serve both the primary and secondary destinations
#[async_trait]
pub trait CmsClient: Send + Sync {
    async fn create_post(&self, creds: &CmsCredentials, post: &NewPost) -> Result<CreatedPost>;

    async fn update_post(&self, creds: &CmsCredentials, id: &str, patch: &PostPatch) -> Result<()>;

    async fn get_post(&self, creds: &CmsCredentials, id: &str) -> Result<RemotePost>;

    async fn upload_media(
        &self,
        creds: &CmsCredentials,
        source_url: &str,
        filename: &str,
    ) -> Result<UploadedMedia>;
}

/// Object storage used to take ownership of generated media before
/// provider links expire
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload_from_url(&self, source_url: &str, dest_path: &str) -> Result<StoredObject>;
}

/// Social scheduling service
#[async_trait]
pub trait SocialClient: Send + Sync {
    async fn post(&self, request: &SocialPostRequest) -> Result<SocialPostReceipt>;
}

/// Podcast host
#[async_trait]
pub trait PodcastHost: Send + Sync {
    async fn publish(&self, episode: &EpisodeDraft) -> Result<PublishedEpisode>;
}

/// The full set of collaborators the orchestrator is constructed with
#[derive(Clone)]
pub struct Clients {
    pub text: Arc<dyn TextGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub audio: Arc<dyn AudioGenerator>,

    /// Ordered video provider fallback chain
    pub video: Vec<Arc<dyn VideoGenerator>>,

    pub cms: Arc<dyn CmsClient>,
    pub storage: Arc<dyn ObjectStorage>,
    pub social: Arc<dyn SocialClient>,
    pub podcast: Arc<dyn PodcastHost>,
}
