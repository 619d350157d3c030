//! Persistence for work items, artifacts and the audit log.
//!
//! The `Store` trait is the narrow contract the pipeline depends on:
//! create/update/find for the work item and each artifact record type,
//! plus append-only insert for audit entries. `SqliteStore` is the
//! production backend; `MemoryStore` backs tests and dry runs.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    AudioArtifact, AuditEntry, ImageArtifact, SocialPost, TextArtifact, VideoArtifact, WorkItem,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate record: {0}")]
    Duplicate(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Transactional store for pipeline state
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_item(&self, item: &WorkItem) -> Result<(), StoreError>;

    async fn update_item(&self, item: &WorkItem) -> Result<(), StoreError>;

    async fn find_item(&self, id: Uuid) -> Result<Option<WorkItem>, StoreError>;

    async fn list_items(&self, limit: usize) -> Result<Vec<WorkItem>, StoreError>;

    async fn upsert_text(&self, artifact: &TextArtifact) -> Result<(), StoreError>;

    async fn find_text(&self, item_id: Uuid) -> Result<Option<TextArtifact>, StoreError>;

    async fn upsert_image(&self, artifact: &ImageArtifact) -> Result<(), StoreError>;

    async fn list_images(&self, item_id: Uuid) -> Result<Vec<ImageArtifact>, StoreError>;

    async fn upsert_audio(&self, artifact: &AudioArtifact) -> Result<(), StoreError>;

    async fn find_audio(&self, item_id: Uuid) -> Result<Option<AudioArtifact>, StoreError>;

    async fn upsert_video(&self, artifact: &VideoArtifact) -> Result<(), StoreError>;

    async fn find_video(&self, item_id: Uuid) -> Result<Option<VideoArtifact>, StoreError>;

    async fn upsert_social_post(&self, post: &SocialPost) -> Result<(), StoreError>;

    async fn list_social_posts(&self, item_id: Uuid) -> Result<Vec<SocialPost>, StoreError>;

    /// Append-only; entries are never updated or deleted
    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError>;

    async fn list_audit(&self, item_id: Uuid) -> Result<Vec<AuditEntry>, StoreError>;
}
