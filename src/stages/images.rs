//! Image generation (critical stage).
//!
//! One image per configured aspect ratio. Already-generated aspects are
//! skipped on resumption; the stage fails as a whole if any remaining
//! aspect fails after retries.

use tracing::{debug, info};

use crate::core::error::PipelineError;
use crate::core::resilience::{with_retry, with_timeout};
use crate::domain::{AuditEntry, ImageArtifact, ImageAspect, WorkItem};
use crate::store::Store;

use super::{audit, timeouts, StageCtx};

pub async fn generate_images(
    ctx: &StageCtx,
    item: &WorkItem,
) -> Result<Vec<ImageArtifact>, PipelineError> {
    let existing = ctx.store.list_images(item.id).await?;
    let aspects = &ctx.settings.generation.image_aspects;

    let mut artifacts: Vec<ImageArtifact> = Vec::with_capacity(aspects.len());
    let mut pending: Vec<ImageAspect> = Vec::new();

    for aspect in aspects {
        match existing
            .iter()
            .find(|i| i.aspect == *aspect && i.status.is_settled())
        {
            Some(done) => {
                debug!(item_id = %item.id, aspect = aspect.as_str(), "image exists, skipping");
                artifacts.push(done.clone());
            }
            None => pending.push(*aspect),
        }
    }

    if pending.is_empty() {
        return Ok(artifacts);
    }

    audit(
        ctx,
        AuditEntry::started(item.id, "stage.images", format!("generating {} image(s)", pending.len())),
    )
    .await;

    let profile = &ctx.settings.business;

    for aspect in pending {
        let operation = format!("image.generate.{}", aspect.as_str());
        let result = with_retry(&operation, &ctx.retry, || {
            with_timeout(
                &operation,
                timeouts::IMAGE_GENERATE,
                ctx.clients.image.generate(profile, &item.topic, aspect),
            )
        })
        .await;

        match result {
            Ok(image) => {
                let artifact =
                    ImageArtifact::ready(item.id, aspect, image.url, image.width, image.height);
                ctx.store.upsert_image(&artifact).await?;
                artifacts.push(artifact);
            }
            Err(e) => {
                audit(ctx, AuditEntry::failed(item.id, "stage.images", e.to_string())).await;
                return Err(e);
            }
        }
    }

    audit(
        ctx,
        AuditEntry::succeeded(item.id, "stage.images", format!("{} image(s) ready", artifacts.len())),
    )
    .await;
    info!(item_id = %item.id, count = artifacts.len(), "images generated");

    Ok(artifacts)
}
