//! Work item state and lifecycle.
//!
//! A WorkItem is the aggregate record for one unit of content moving
//! through the pipeline, from draft through generation and distribution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unit of content moving through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique identifier for this item
    pub id: Uuid,

    /// The business this content belongs to
    pub business_id: Uuid,

    /// Topic the content is generated from
    pub topic: String,

    /// Current lifecycle status
    pub status: ItemStatus,

    /// Label of the in-flight stage (cleared on terminal status)
    pub current_stage: Option<String>,

    /// Number of full pipeline retries consumed
    pub retry_count: u32,

    /// Diagnostic text from the most recent failure
    pub last_error: Option<String>,

    /// External id of the primary published post
    pub primary_post_id: Option<String>,

    /// Public URL of the primary published post
    pub primary_url: Option<String>,

    pub primary_published: bool,
    pub primary_published_at: Option<DateTime<Utc>>,

    pub secondary_published: bool,
    pub secondary_published_at: Option<DateTime<Utc>>,

    pub audio_generated: bool,
    pub audio_generated_at: Option<DateTime<Utc>>,

    pub video_generated: bool,
    pub video_generated_at: Option<DateTime<Utc>>,

    pub social_distributed: bool,
    pub social_distributed_at: Option<DateTime<Utc>>,

    pub metadata_embedded: bool,
    pub metadata_embedded_at: Option<DateTime<Utc>>,

    /// When the item was created
    pub created_at: DateTime<Utc>,

    /// When the item was last updated
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// Create a new draft item for a topic
    pub fn new(business_id: Uuid, topic: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            business_id,
            topic: topic.into(),
            status: ItemStatus::Draft,
            current_stage: None,
            retry_count: 0,
            last_error: None,
            primary_post_id: None,
            primary_url: None,
            primary_published: false,
            primary_published_at: None,
            secondary_published: false,
            secondary_published_at: None,
            audio_generated: false,
            audio_generated_at: None,
            video_generated: false,
            video_generated_at: None,
            social_distributed: false,
            social_distributed_at: None,
            metadata_embedded: false,
            metadata_embedded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a new stage, touching `updated_at`
    pub fn enter_stage(&mut self, stage: &str) {
        self.current_stage = Some(stage.to_string());
        self.updated_at = Utc::now();
    }

    /// Record the primary publication result
    pub fn mark_primary_published(&mut self, post_id: String, url: String) {
        self.primary_post_id = Some(post_id);
        self.primary_url = Some(url);
        self.primary_published = true;
        self.primary_published_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn mark_secondary_published(&mut self) {
        self.secondary_published = true;
        self.secondary_published_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn mark_audio_generated(&mut self) {
        self.audio_generated = true;
        self.audio_generated_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn mark_video_generated(&mut self) {
        self.video_generated = true;
        self.video_generated_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn mark_social_distributed(&mut self) {
        self.social_distributed = true;
        self.social_distributed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn mark_metadata_embedded(&mut self) {
        self.metadata_embedded = true;
        self.metadata_embedded_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Settle the item into a terminal status, clearing the stage label
    pub fn finish(&mut self, status: ItemStatus) {
        self.status = status;
        self.current_stage = None;
        self.updated_at = Utc::now();
    }

    /// Check whether the item is in a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Lifecycle status of a work item
///
/// `Failed` is reachable only from a critical-stage failure. Non-critical
/// failures lower the outcome from `Published` to `Review` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Created, nothing generated yet
    Draft,

    /// Generation stages are running
    Generating,

    /// Distribution stages are running
    Publishing,

    /// Primary publication succeeded
    Published,

    /// Generation succeeded but the item needs manual completion
    Review,

    /// A critical stage failed after exhausting retries
    Failed,
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Review | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Generating => "generating",
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::Review => "review",
            Self::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_is_draft() {
        let item = WorkItem::new(Uuid::new_v4(), "fall gutter cleaning specials");

        assert_eq!(item.status, ItemStatus::Draft);
        assert_eq!(item.retry_count, 0);
        assert!(item.current_stage.is_none());
        assert!(!item.is_terminal());
    }

    #[test]
    fn test_finish_clears_stage() {
        let mut item = WorkItem::new(Uuid::new_v4(), "topic");
        item.enter_stage("text");
        assert_eq!(item.current_stage.as_deref(), Some("text"));

        item.finish(ItemStatus::Published);
        assert!(item.current_stage.is_none());
        assert!(item.is_terminal());
    }

    #[test]
    fn test_channel_flags_carry_timestamps() {
        let mut item = WorkItem::new(Uuid::new_v4(), "topic");
        assert!(!item.audio_generated);
        assert!(item.audio_generated_at.is_none());

        item.mark_audio_generated();
        assert!(item.audio_generated);
        assert!(item.audio_generated_at.is_some());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ItemStatus::Review).unwrap();
        assert_eq!(json, "\"review\"");

        let parsed: ItemStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, ItemStatus::Failed);
    }
}
