//! Pipeline orchestrator: the top-level state machine.
//!
//! Sequences generation (critical, sequential), publishing (non-critical)
//! and distribution (parallel), decides abort-vs-continue on failure, and
//! computes the final status. Re-running on a partially-completed item is
//! safe: every stage checks for its own artifact before calling out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::clients::Clients;
use crate::config::SettingsProvider;
use crate::domain::{AuditEntry, ImageArtifact, ItemStatus, TextArtifact, WorkItem};
use crate::stages::{self, audit, StageCtx, StageOutcome};
use crate::store::Store;

use super::coordinator;
use super::error::PipelineError;

/// Maximum number of full pipeline retries per work item
pub const RETRY_CEILING: u32 = 3;

/// The content pipeline orchestrator
pub struct Orchestrator {
    store: Arc<dyn Store>,
    settings: Arc<dyn SettingsProvider>,
    clients: Clients,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        settings: Arc<dyn SettingsProvider>,
        clients: Clients,
    ) -> Self {
        Self {
            store,
            settings,
            clients,
        }
    }

    /// Run the full pipeline for a work item.
    ///
    /// Returns an error only for unrecoverable problems (item not found,
    /// settings or store unavailable) and for critical-stage failures,
    /// which leave the item `Failed` with its retry count incremented.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn run(&self, item_id: Uuid) -> Result<WorkItem, PipelineError> {
        let mut item = self
            .store
            .find_item(item_id)
            .await?
            .ok_or(PipelineError::ItemNotFound { item_id })?;

        let ctx = self.stage_ctx().await?;

        info!(topic = %item.topic, status = item.status.as_str(), "starting pipeline run");
        audit(
            &ctx,
            AuditEntry::started(item.id, "pipeline.run", format!("run started for '{}'", item.topic)),
        )
        .await;

        item.status = ItemStatus::Generating;
        item.enter_stage("text");
        self.store.update_item(&item).await?;

        // Critical stages run strictly sequentially; a failure aborts the
        // run with nothing downstream executed
        let mut text = match stages::text::generate_text(&ctx, &item).await {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.fail_critical(&ctx, &mut item, e).await),
        };

        item.enter_stage("images");
        self.store.update_item(&item).await?;

        let images = match stages::images::generate_images(&ctx, &item).await {
            Ok(artifacts) => artifacts,
            Err(e) => return Err(self.fail_critical(&ctx, &mut item, e).await),
        };

        let primary = self
            .run_distribution(&ctx, &mut item, &mut text, &images)
            .await?;

        let status = final_status(&primary);
        item.finish(status);
        self.store.update_item(&item).await?;

        audit(
            &ctx,
            AuditEntry::succeeded(item.id, "pipeline.run", format!("run settled as '{}'", status.as_str())),
        )
        .await;
        info!(status = status.as_str(), "pipeline run settled");

        Ok(item)
    }

    /// Re-run a work item, rejecting once the retry ceiling is reached.
    /// Completed stages are skipped via idempotent resumption.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn retry(&self, item_id: Uuid) -> Result<WorkItem, PipelineError> {
        let item = self
            .store
            .find_item(item_id)
            .await?
            .ok_or(PipelineError::ItemNotFound { item_id })?;

        if item.retry_count >= RETRY_CEILING {
            return Err(PipelineError::RetryExhausted {
                item_id,
                retry_count: item.retry_count,
                ceiling: RETRY_CEILING,
            });
        }

        info!(retry_count = item.retry_count, "retrying pipeline run");
        self.run(item_id).await
    }

    /// Publishing and distribution: the non-critical half of the
    /// pipeline, shared with the manual publish flow. Returns the primary
    /// publish outcome, which alone decides the final status.
    pub(crate) async fn run_distribution(
        &self,
        ctx: &StageCtx,
        item: &mut WorkItem,
        text: &mut TextArtifact,
        images: &[ImageArtifact],
    ) -> Result<StageOutcome, PipelineError> {
        item.status = ItemStatus::Publishing;
        item.enter_stage("publish");
        self.store.update_item(item).await?;

        let primary = stages::publish::publish_primary(ctx, item, text, images).await;
        self.store.update_item(item).await?;

        let secondary = stages::publish::publish_secondary(ctx, item, text).await;
        if let Some(err) = secondary.error() {
            info!(error = err, "secondary publish did not complete");
        }
        self.store.update_item(item).await?;

        item.enter_stage("distribute");
        self.store.update_item(item).await?;

        let report = coordinator::distribute(ctx, item, text, images).await;
        if report.any_failed() {
            info!("one or more distribution sub-pipelines failed; continuing");
        }
        self.store.update_item(item).await?;

        item.enter_stage("finalize");
        self.store.update_item(item).await?;

        let finalized = stages::finalize::finalize(ctx, item, text).await;
        if let Some(err) = finalized.error() {
            info!(error = err, "finalization did not complete");
        }
        self.store.update_item(item).await?;

        Ok(primary.outcome)
    }

    pub(crate) async fn stage_ctx(&self) -> Result<StageCtx, PipelineError> {
        let settings = self
            .settings
            .settings()
            .await
            .map_err(|e| PipelineError::Settings(format!("{e:#}")))?;

        Ok(StageCtx {
            store: Arc::clone(&self.store),
            clients: self.clients.clone(),
            retry: settings.retry.clone(),
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            settings,
        })
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Persist a critical-stage failure: `Failed` status, recorded error,
    /// incremented retry count. The error is handed back for re-raising.
    async fn fail_critical(
        &self,
        ctx: &StageCtx,
        item: &mut WorkItem,
        error: PipelineError,
    ) -> PipelineError {
        error!(item_id = %item.id, error = %error, "critical stage failed, aborting run");

        item.retry_count += 1;
        item.last_error = Some(error.to_string());
        item.finish(ItemStatus::Failed);

        if let Err(store_err) = self.store.update_item(item).await {
            error!(error = %store_err, "failed to persist failed item state");
        }

        audit(ctx, AuditEntry::failed(item.id, "pipeline.run", error.to_string())).await;
        error
    }
}

/// Final status from the primary publish outcome alone: distribution
/// failures are recorded per channel and never demote the run.
fn final_status(primary: &StageOutcome) -> ItemStatus {
    if primary.succeeded() {
        ItemStatus::Published
    } else {
        ItemStatus::Review
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_status_from_primary_outcome() {
        assert_eq!(
            final_status(&StageOutcome::Completed),
            ItemStatus::Published
        );
        assert_eq!(
            final_status(&StageOutcome::skip("unconfigured")),
            ItemStatus::Review
        );
        assert_eq!(
            final_status(&StageOutcome::fail("cms down")),
            ItemStatus::Review
        );
    }
}
