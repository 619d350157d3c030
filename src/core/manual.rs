//! Manual publish flow.
//!
//! Secondary entry point for review/approval workflows: re-runs the
//! distribution half of the pipeline against already-generated artifacts,
//! sharing the stage implementations and resilience primitives with the
//! main run.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{AuditEntry, ItemStatus, WorkItem};
use crate::stages::audit;
use crate::store::Store;

use super::error::PipelineError;
use super::orchestrator::Orchestrator;

impl Orchestrator {
    /// Publish an item whose content was already generated.
    ///
    /// Requires a settled text artifact; generation stages are not run.
    /// Already-published channels are skipped via the stages' own
    /// idempotency checks.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn publish(&self, item_id: Uuid) -> Result<WorkItem, PipelineError> {
        let mut item = self
            .store()
            .find_item(item_id)
            .await?
            .ok_or(PipelineError::ItemNotFound { item_id })?;

        let ctx = self.stage_ctx().await?;

        let mut text = ctx
            .store
            .find_text(item_id)
            .await?
            .filter(|t| t.status.is_settled())
            .ok_or(PipelineError::MissingArtifact {
                item_id,
                kind: "text",
            })?;

        let images = ctx.store.list_images(item_id).await?;

        info!(topic = %item.topic, "starting manual publish");
        audit(
            &ctx,
            AuditEntry::started(item.id, "pipeline.publish", "manual publish started"),
        )
        .await;

        let primary = self
            .run_distribution(&ctx, &mut item, &mut text, &images)
            .await?;

        let status = if primary.succeeded() {
            ItemStatus::Published
        } else {
            ItemStatus::Review
        };
        item.finish(status);
        self.store().update_item(&item).await?;

        audit(
            &ctx,
            AuditEntry::succeeded(item.id, "pipeline.publish", format!("manual publish settled as '{}'", status.as_str())),
        )
        .await;
        info!(status = status.as_str(), "manual publish settled");

        Ok(item)
    }
}
