//! Article text generation (critical stage).
//!
//! Everything downstream hangs off the generated article, so a failure
//! here aborts the run.

use tracing::{debug, info};

use crate::core::error::PipelineError;
use crate::core::resilience::{with_retry, with_timeout};
use crate::domain::{AuditEntry, TextArtifact, WorkItem};
use crate::store::Store;

use super::{audit, timeouts, StageCtx};

pub async fn generate_text(ctx: &StageCtx, item: &WorkItem) -> Result<TextArtifact, PipelineError> {
    // Idempotent resumption: an existing settled artifact means the side
    // effect already happened
    if let Some(existing) = ctx.store.find_text(item.id).await? {
        if existing.status.is_settled() {
            debug!(item_id = %item.id, "text artifact exists, skipping generation");
            return Ok(existing);
        }
    }

    audit(
        ctx,
        AuditEntry::started(item.id, "stage.text", format!("generating article for '{}'", item.topic)),
    )
    .await;

    let profile = &ctx.settings.business;
    let result = with_retry("text.generate", &ctx.retry, || {
        with_timeout(
            "text.generate",
            timeouts::TEXT_GENERATE,
            ctx.clients.text.generate(profile, &item.topic),
        )
    })
    .await;

    match result {
        Ok(article) => {
            let artifact = TextArtifact::from_generated(item.id, article);
            ctx.store.upsert_text(&artifact).await?;
            audit(
                ctx,
                AuditEntry::succeeded(item.id, "stage.text", format!("article '{}' generated", artifact.title)),
            )
            .await;
            info!(item_id = %item.id, slug = %artifact.slug, "article generated");
            Ok(artifact)
        }
        Err(e) => {
            audit(ctx, AuditEntry::failed(item.id, "stage.text", e.to_string())).await;
            Err(e)
        }
    }
}
