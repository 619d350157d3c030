//! Artifact records produced by pipeline stages.
//!
//! Each artifact belongs to exactly one work item, is created once by its
//! generating stage, and carries its own lifecycle status independent of
//! the item's. An artifact at `Ready` or later is immutable except for
//! publication metadata (external id, URL, published-at).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::clients::GeneratedArticle;

/// Per-record lifecycle status of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Created, provider not yet called
    Pending,

    /// Provider job in flight (carries the job id for re-attachment)
    Processing,

    /// Generation finished, output available
    Ready,

    /// Pushed to its destination channel
    Published,

    /// Provider reported a terminal failure
    Failed,
}

impl ArtifactStatus {
    /// Terminal-success states: the generating side effect already happened
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready | Self::Published)
    }
}

/// Generated article text and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextArtifact {
    pub id: Uuid,
    pub item_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body_html: String,
    pub excerpt: String,
    pub meta_title: String,
    pub meta_description: String,
    pub status: ArtifactStatus,

    /// External id once published to the primary CMS
    pub external_id: Option<String>,

    /// Public URL once published
    pub external_url: Option<String>,

    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TextArtifact {
    pub fn from_generated(item_id: Uuid, article: GeneratedArticle) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            title: article.title,
            slug: article.slug,
            body_html: article.body_html,
            excerpt: article.excerpt,
            meta_title: article.meta_title,
            meta_description: article.meta_description,
            status: ArtifactStatus::Ready,
            external_id: None,
            external_url: None,
            published_at: None,
            created_at: Utc::now(),
        }
    }

    /// Record the primary publication result on the artifact
    pub fn mark_published(&mut self, external_id: String, url: String) {
        self.external_id = Some(external_id);
        self.external_url = Some(url);
        self.published_at = Some(Utc::now());
        self.status = ArtifactStatus::Published;
    }
}

/// Aspect ratio a generated image was requested at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAspect {
    /// 16:9, used as the article hero
    Landscape,

    /// 1:1, used for social posts
    Square,

    /// 9:16, used for short video
    Portrait,
}

impl ImageAspect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Square => "square",
            Self::Portrait => "portrait",
        }
    }
}

/// One generated image at a specific aspect ratio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub id: Uuid,
    pub item_id: Uuid,
    pub aspect: ImageAspect,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub status: ArtifactStatus,
    pub created_at: DateTime<Utc>,
}

impl ImageArtifact {
    pub fn ready(item_id: Uuid, aspect: ImageAspect, url: String, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            aspect,
            url,
            width,
            height,
            status: ArtifactStatus::Ready,
            created_at: Utc::now(),
        }
    }
}

/// Generated podcast audio and its published episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub id: Uuid,
    pub item_id: Uuid,

    /// Provider job id, kept for re-attachment while `Processing`
    pub job_id: Option<String>,

    /// URL of the finished audio file (ours, after storage upload)
    pub audio_url: Option<String>,

    pub episode_id: Option<String>,
    pub episode_url: Option<String>,
    pub player_url: Option<String>,

    pub status: ArtifactStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl AudioArtifact {
    pub fn pending(item_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            job_id: None,
            audio_url: None,
            episode_id: None,
            episode_url: None,
            player_url: None,
            status: ArtifactStatus::Pending,
            error: None,
            created_at: Utc::now(),
            published_at: None,
        }
    }
}

/// Generated short video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub id: Uuid,
    pub item_id: Uuid,

    /// Which provider in the fallback chain produced the job
    pub provider: Option<String>,

    /// Provider job id, kept for re-attachment while `Processing`
    pub job_id: Option<String>,

    pub video_url: Option<String>,
    pub status: ArtifactStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VideoArtifact {
    pub fn pending(item_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            provider: None,
            job_id: None,
            video_url: None,
            status: ArtifactStatus::Pending,
            error: None,
            created_at: Utc::now(),
        }
    }
}

/// One social post attempt on one platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: Uuid,
    pub item_id: Uuid,
    pub platform: String,

    /// Deterministic key for (item, platform); guards against duplicate posts
    pub dedup_key: String,

    pub caption: String,
    pub status: ArtifactStatus,
    pub post_id: Option<String>,
    pub published_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SocialPost {
    pub fn new(item_id: Uuid, platform: impl Into<String>, caption: impl Into<String>) -> Self {
        let platform = platform.into();
        Self {
            id: Uuid::new_v4(),
            item_id,
            dedup_key: social_dedup_key(item_id, &platform),
            platform,
            caption: caption.into(),
            status: ArtifactStatus::Pending,
            post_id: None,
            published_url: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn mark_published(&mut self, post_id: String, url: Option<String>) {
        self.post_id = Some(post_id);
        self.published_url = url;
        self.status = ArtifactStatus::Published;
        self.error = None;
    }

    pub fn mark_failed(&mut self, reason: String) {
        self.status = ArtifactStatus::Failed;
        self.error = Some(reason);
    }
}

/// Deterministic dedup key for a social post: first 8 bytes of
/// SHA256("{item_id}:{platform}"), hex-encoded
pub fn social_dedup_key(item_id: Uuid, platform: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", item_id, platform).as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
