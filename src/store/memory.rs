//! In-memory store for tests and dry runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    AudioArtifact, AuditEntry, ImageArtifact, SocialPost, TextArtifact, VideoArtifact, WorkItem,
};

use super::{Store, StoreError};

#[derive(Default)]
struct Inner {
    items: HashMap<Uuid, WorkItem>,
    texts: HashMap<Uuid, TextArtifact>,
    images: HashMap<Uuid, Vec<ImageArtifact>>,
    audio: HashMap<Uuid, AudioArtifact>,
    video: HashMap<Uuid, VideoArtifact>,
    social: HashMap<Uuid, Vec<SocialPost>>,
    audit: Vec<AuditEntry>,
}

/// HashMap-backed store behind a single async mutex
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_item(&self, item: &WorkItem) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.items.contains_key(&item.id) {
            return Err(StoreError::Duplicate(item.id.to_string()));
        }
        inner.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&self, item: &WorkItem) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<WorkItem>, StoreError> {
        Ok(self.inner.lock().await.items.get(&id).cloned())
    }

    async fn list_items(&self, limit: usize) -> Result<Vec<WorkItem>, StoreError> {
        let inner = self.inner.lock().await;
        let mut items: Vec<WorkItem> = inner.items.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit);
        Ok(items)
    }

    async fn upsert_text(&self, artifact: &TextArtifact) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.texts.insert(artifact.item_id, artifact.clone());
        Ok(())
    }

    async fn find_text(&self, item_id: Uuid) -> Result<Option<TextArtifact>, StoreError> {
        Ok(self.inner.lock().await.texts.get(&item_id).cloned())
    }

    async fn upsert_image(&self, artifact: &ImageArtifact) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let images = inner.images.entry(artifact.item_id).or_default();
        match images.iter_mut().find(|i| i.id == artifact.id) {
            Some(existing) => *existing = artifact.clone(),
            None => images.push(artifact.clone()),
        }
        Ok(())
    }

    async fn list_images(&self, item_id: Uuid) -> Result<Vec<ImageArtifact>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .images
            .get(&item_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_audio(&self, artifact: &AudioArtifact) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.audio.insert(artifact.item_id, artifact.clone());
        Ok(())
    }

    async fn find_audio(&self, item_id: Uuid) -> Result<Option<AudioArtifact>, StoreError> {
        Ok(self.inner.lock().await.audio.get(&item_id).cloned())
    }

    async fn upsert_video(&self, artifact: &VideoArtifact) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.video.insert(artifact.item_id, artifact.clone());
        Ok(())
    }

    async fn find_video(&self, item_id: Uuid) -> Result<Option<VideoArtifact>, StoreError> {
        Ok(self.inner.lock().await.video.get(&item_id).cloned())
    }

    async fn upsert_social_post(&self, post: &SocialPost) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let posts = inner.social.entry(post.item_id).or_default();
        match posts.iter_mut().find(|p| p.dedup_key == post.dedup_key) {
            Some(existing) => *existing = post.clone(),
            None => posts.push(post.clone()),
        }
        Ok(())
    }

    async fn list_social_posts(&self, item_id: Uuid) -> Result<Vec<SocialPost>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .social
            .get(&item_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.inner.lock().await.audit.push(entry.clone());
        Ok(())
    }

    async fn list_audit(&self, item_id: Uuid) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .audit
            .iter()
            .filter(|e| e.item_id == item_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemStatus;

    #[tokio::test]
    async fn test_item_roundtrip() {
        let store = MemoryStore::new();
        let mut item = WorkItem::new(Uuid::new_v4(), "winter HVAC maintenance");

        store.create_item(&item).await.unwrap();
        assert!(store.create_item(&item).await.is_err());

        item.status = ItemStatus::Generating;
        store.update_item(&item).await.unwrap();

        let found = store.find_item(item.id).await.unwrap().unwrap();
        assert_eq!(found.status, ItemStatus::Generating);

        assert!(store.find_item(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_social_posts_dedup_by_key() {
        let store = MemoryStore::new();
        let item_id = Uuid::new_v4();

        let mut post = SocialPost::new(item_id, "facebook", "caption");
        store.upsert_social_post(&post).await.unwrap();

        post.mark_published("fb-123".to_string(), None);
        store.upsert_social_post(&post).await.unwrap();

        let posts = store.list_social_posts(item_id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post_id.as_deref(), Some("fb-123"));
    }

    #[tokio::test]
    async fn test_audit_is_append_only() {
        let store = MemoryStore::new();
        let item_id = Uuid::new_v4();

        store
            .append_audit(&AuditEntry::started(item_id, "stage.text", "started"))
            .await
            .unwrap();
        store
            .append_audit(&AuditEntry::succeeded(item_id, "stage.text", "done"))
            .await
            .unwrap();

        let entries = store.list_audit(item_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "stage.text");
    }
}
