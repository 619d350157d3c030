//! Video sub-pipeline with an ordered provider fallback chain.
//!
//! Providers are tried in order until one accepts the job; the accepted
//! provider's name is recorded on the artifact so a `Processing` run can
//! re-attach to the same job after a crash.

use tracing::{debug, info, warn};

use crate::clients::{JobState, VideoGenerator, VideoRequest};
use crate::core::error::PipelineError;
use crate::core::resilience::{poll_until, with_timeout};
use crate::domain::{ArtifactStatus, ImageArtifact, TextArtifact, VideoArtifact, WorkItem};
use crate::store::Store;

use super::{timeouts, StageCtx, StageOutcome};

pub async fn run_video(
    ctx: &StageCtx,
    item: &WorkItem,
    text: &TextArtifact,
    images: &[ImageArtifact],
) -> StageOutcome {
    let configured = ctx
        .settings
        .video
        .as_ref()
        .map(|v| !v.providers.is_empty())
        .unwrap_or(false);

    if !configured || ctx.clients.video.is_empty() {
        return StageOutcome::skip("video generation not configured");
    }

    let mut artifact = match ctx.store.find_video(item.id).await {
        Ok(Some(existing)) => existing,
        Ok(None) => VideoArtifact::pending(item.id),
        Err(e) => return StageOutcome::fail(e),
    };

    if artifact.status.is_settled() {
        debug!(item_id = %item.id, "video already generated, skipping");
        return StageOutcome::Completed;
    }

    match generate(ctx, item, text, images, &mut artifact).await {
        Ok(()) => StageOutcome::Completed,
        Err(e) => {
            if !artifact.status.is_settled() {
                artifact.status = ArtifactStatus::Failed;
                artifact.error = Some(e.to_string());
            }
            if let Err(store_err) = ctx.store.upsert_video(&artifact).await {
                warn!(item_id = %item.id, error = %store_err, "failed to persist video failure");
            }
            warn!(item_id = %item.id, error = %e, "video sub-pipeline failed");
            StageOutcome::fail(e)
        }
    }
}

async fn generate(
    ctx: &StageCtx,
    item: &WorkItem,
    text: &TextArtifact,
    images: &[ImageArtifact],
    artifact: &mut VideoArtifact,
) -> Result<(), PipelineError> {
    // Re-attach to an in-flight job rather than creating a duplicate
    if artifact.status == ArtifactStatus::Processing {
        if let (Some(provider), Some(job_id)) = (artifact.provider.clone(), artifact.job_id.clone())
        {
            match ctx.clients.video.iter().find(|g| g.name() == provider) {
                Some(generator) => {
                    debug!(item_id = %item.id, provider = %provider, job_id = %job_id, "re-attaching to video job");
                    let url = poll_video(ctx, generator.as_ref(), &job_id).await?;
                    return store_result(ctx, item, artifact, url).await;
                }
                None => {
                    warn!(provider = %provider, "video provider no longer configured, restarting job")
                }
            }
        }
    }

    let request = VideoRequest {
        title: text.title.clone(),
        script: text.excerpt.clone(),
        source_url: pick_source_image(images),
    };

    let mut last_error: Option<PipelineError> = None;

    for generator in &ctx.clients.video {
        match with_timeout(
            "video.create_job",
            timeouts::JOB_CALL,
            generator.create_job(&request),
        )
        .await
        {
            Ok(job_id) => {
                artifact.provider = Some(generator.name().to_string());
                artifact.job_id = Some(job_id.clone());
                artifact.status = ArtifactStatus::Processing;
                ctx.store.upsert_video(artifact).await?;

                let url = poll_video(ctx, generator.as_ref(), &job_id).await?;
                return store_result(ctx, item, artifact, url).await;
            }
            Err(e) => {
                warn!(provider = generator.name(), error = %e, "video provider rejected job, trying next");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        PipelineError::provider("video.create_job", "no video providers accepted the job")
    }))
}

async fn poll_video(
    ctx: &StageCtx,
    generator: &dyn VideoGenerator,
    job_id: &str,
) -> Result<String, PipelineError> {
    poll_until(
        "video.poll",
        timeouts::VIDEO_JOB,
        ctx.poll_interval,
        || async {
            let status = with_timeout(
                "video.poll",
                timeouts::JOB_CALL,
                generator.poll_job(job_id),
            )
            .await?;

            match status.state {
                JobState::Ready => {
                    let url = status.video_url.ok_or_else(|| {
                        PipelineError::provider("video.poll", "job ready without video_url")
                    })?;
                    Ok(Some(url))
                }
                JobState::Failed => Err(PipelineError::provider(
                    "video.poll",
                    status
                        .failed_reason
                        .unwrap_or_else(|| "video job failed".to_string()),
                )),
                _ => Ok(None),
            }
        },
    )
    .await
}

async fn store_result(
    ctx: &StageCtx,
    item: &WorkItem,
    artifact: &mut VideoArtifact,
    provider_url: String,
) -> Result<(), PipelineError> {
    let owned_url = if ctx.settings.storage.is_some() {
        let dest = format!("video/{}.mp4", item.id);
        with_timeout(
            "storage.upload",
            timeouts::STORAGE_UPLOAD,
            ctx.clients.storage.upload_from_url(&provider_url, &dest),
        )
        .await?
        .url
    } else {
        provider_url
    };

    artifact.video_url = Some(owned_url);
    artifact.status = ArtifactStatus::Ready;
    artifact.error = None;
    ctx.store.upsert_video(artifact).await?;

    info!(item_id = %item.id, provider = artifact.provider.as_deref().unwrap_or("?"), "video generated");
    Ok(())
}

/// Prefer the portrait image for short-form video, fall back to landscape
fn pick_source_image(images: &[ImageArtifact]) -> Option<String> {
    use crate::domain::ImageAspect;

    images
        .iter()
        .find(|i| i.aspect == ImageAspect::Portrait)
        .or_else(|| images.iter().find(|i| i.aspect == ImageAspect::Landscape))
        .map(|i| i.url.clone())
}
