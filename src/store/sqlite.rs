//! Sqlite-backed store.
//!
//! Rows keep a few queryable columns (ids, kind, status) and serialize the
//! full record as a JSON payload. All writes go through a single
//! connection in WAL mode; sqlite gives each statement transactional
//! semantics.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    AudioArtifact, AuditEntry, ImageArtifact, SocialPost, TextArtifact, VideoArtifact, WorkItem,
};

use super::{Store, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS work_items (
    id          TEXT PRIMARY KEY,
    status      TEXT NOT NULL,
    payload     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS artifacts (
    id          TEXT PRIMARY KEY,
    item_id     TEXT NOT NULL,
    kind        TEXT NOT NULL,
    payload     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_artifacts_item_kind ON artifacts(item_id, kind);

CREATE TABLE IF NOT EXISTS audit_log (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id     TEXT NOT NULL,
    payload     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_item ON audit_log(item_id);
";

/// Sqlite store over a single connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection mutex poisoned".to_string()))
    }

    fn upsert_artifact<T: Serialize>(
        &self,
        id: Uuid,
        item_id: Uuid,
        kind: &str,
        record: &T,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(record)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO artifacts (id, item_id, kind, payload) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET payload = excluded.payload",
            params![id.to_string(), item_id.to_string(), kind, payload],
        )?;
        Ok(())
    }

    fn find_artifact<T: DeserializeOwned>(
        &self,
        item_id: Uuid,
        kind: &str,
    ) -> Result<Option<T>, StoreError> {
        let conn = self.lock()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM artifacts WHERE item_id = ?1 AND kind = ?2 LIMIT 1",
                params![item_id.to_string(), kind],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn list_artifacts<T: DeserializeOwned>(
        &self,
        item_id: Uuid,
        kind: &str,
    ) -> Result<Vec<T>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT payload FROM artifacts WHERE item_id = ?1 AND kind = ?2 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![item_id.to_string(), kind], |row| {
            row.get::<_, String>(0)
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_item(&self, item: &WorkItem) -> Result<(), StoreError> {
        let payload = serde_json::to_string(item)?;
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO work_items (id, status, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                item.id.to_string(),
                item.status.as_str(),
                payload,
                item.created_at.to_rfc3339()
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::Duplicate(item.id.to_string()));
        }
        Ok(())
    }

    async fn update_item(&self, item: &WorkItem) -> Result<(), StoreError> {
        let payload = serde_json::to_string(item)?;
        let conn = self.lock()?;
        conn.execute(
            "UPDATE work_items SET status = ?2, payload = ?3 WHERE id = ?1",
            params![item.id.to_string(), item.status.as_str(), payload],
        )?;
        Ok(())
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<WorkItem>, StoreError> {
        let conn = self.lock()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM work_items WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn list_items(&self, limit: usize) -> Result<Vec<WorkItem>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT payload FROM work_items ORDER BY created_at DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(serde_json::from_str(&row?)?);
        }
        Ok(items)
    }

    async fn upsert_text(&self, artifact: &TextArtifact) -> Result<(), StoreError> {
        self.upsert_artifact(artifact.id, artifact.item_id, "text", artifact)
    }

    async fn find_text(&self, item_id: Uuid) -> Result<Option<TextArtifact>, StoreError> {
        self.find_artifact(item_id, "text")
    }

    async fn upsert_image(&self, artifact: &ImageArtifact) -> Result<(), StoreError> {
        self.upsert_artifact(artifact.id, artifact.item_id, "image", artifact)
    }

    async fn list_images(&self, item_id: Uuid) -> Result<Vec<ImageArtifact>, StoreError> {
        self.list_artifacts(item_id, "image")
    }

    async fn upsert_audio(&self, artifact: &AudioArtifact) -> Result<(), StoreError> {
        self.upsert_artifact(artifact.id, artifact.item_id, "audio", artifact)
    }

    async fn find_audio(&self, item_id: Uuid) -> Result<Option<AudioArtifact>, StoreError> {
        self.find_artifact(item_id, "audio")
    }

    async fn upsert_video(&self, artifact: &VideoArtifact) -> Result<(), StoreError> {
        self.upsert_artifact(artifact.id, artifact.item_id, "video", artifact)
    }

    async fn find_video(&self, item_id: Uuid) -> Result<Option<VideoArtifact>, StoreError> {
        self.find_artifact(item_id, "video")
    }

    async fn upsert_social_post(&self, post: &SocialPost) -> Result<(), StoreError> {
        self.upsert_artifact(post.id, post.item_id, "social", post)
    }

    async fn list_social_posts(&self, item_id: Uuid) -> Result<Vec<SocialPost>, StoreError> {
        self.list_artifacts(item_id, "social")
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        let payload = serde_json::to_string(entry)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO audit_log (item_id, payload) VALUES (?1, ?2)",
            params![entry.item_id.to_string(), payload],
        )?;
        Ok(())
    }

    async fn list_audit(&self, item_id: Uuid) -> Result<Vec<AuditEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT payload FROM audit_log WHERE item_id = ?1 ORDER BY seq")?;
        let rows = stmt.query_map(params![item_id.to_string()], |row| {
            row.get::<_, String>(0)
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(serde_json::from_str(&row?)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactStatus, ItemStatus};

    #[tokio::test]
    async fn test_item_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut item = WorkItem::new(Uuid::new_v4(), "spring lawn care checklist");

        store.create_item(&item).await.unwrap();
        assert!(matches!(
            store.create_item(&item).await,
            Err(StoreError::Duplicate(_))
        ));

        item.status = ItemStatus::Review;
        item.last_error = Some("primary publish failed".to_string());
        store.update_item(&item).await.unwrap();

        let found = store.find_item(item.id).await.unwrap().unwrap();
        assert_eq!(found.status, ItemStatus::Review);
        assert_eq!(found.last_error.as_deref(), Some("primary publish failed"));
    }

    #[tokio::test]
    async fn test_artifact_upsert_replaces() {
        let store = SqliteStore::open_in_memory().unwrap();
        let item_id = Uuid::new_v4();

        let mut artifact = AudioArtifact::pending(item_id);
        store.upsert_audio(&artifact).await.unwrap();

        artifact.status = ArtifactStatus::Processing;
        artifact.job_id = Some("job-7".to_string());
        store.upsert_audio(&artifact).await.unwrap();

        let found = store.find_audio(item_id).await.unwrap().unwrap();
        assert_eq!(found.status, ArtifactStatus::Processing);
        assert_eq!(found.job_id.as_deref(), Some("job-7"));
    }

    #[tokio::test]
    async fn test_images_listed_in_insert_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let item_id = Uuid::new_v4();

        for (aspect, url) in [
            (crate::domain::ImageAspect::Landscape, "https://a/1.png"),
            (crate::domain::ImageAspect::Square, "https://a/2.png"),
        ] {
            let artifact = ImageArtifact::ready(item_id, aspect, url.to_string(), 1024, 1024);
            store.upsert_image(&artifact).await.unwrap();
        }

        let images = store.list_images(item_id).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].url, "https://a/1.png");
    }

    #[tokio::test]
    async fn test_audit_ordering() {
        let store = SqliteStore::open_in_memory().unwrap();
        let item_id = Uuid::new_v4();

        for action in ["pipeline.run", "stage.text", "stage.images"] {
            store
                .append_audit(&AuditEntry::started(item_id, action, "started"))
                .await
                .unwrap();
        }

        let entries = store.list_audit(item_id).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].action, "stage.text");
    }
}
