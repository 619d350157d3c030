//! Audio sub-pipeline: generate a narration, take ownership of the file,
//! publish the podcast episode.
//!
//! Non-critical: every failure is converted into a `StageOutcome`. A
//! `Processing` artifact re-attaches to its provider job instead of
//! creating a duplicate.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::clients::{EpisodeDraft, JobState};
use crate::core::error::PipelineError;
use crate::core::resilience::{poll_until, with_timeout};
use crate::domain::{ArtifactStatus, AudioArtifact, TextArtifact, WorkItem};
use crate::store::Store;

use super::{timeouts, StageCtx, StageOutcome};

pub async fn run_audio(ctx: &StageCtx, item: &WorkItem, text: &TextArtifact) -> StageOutcome {
    if ctx.settings.podcast.is_none() {
        return StageOutcome::skip("podcast host not configured");
    }

    let mut artifact = match ctx.store.find_audio(item.id).await {
        Ok(Some(existing)) => existing,
        Ok(None) => AudioArtifact::pending(item.id),
        Err(e) => return StageOutcome::fail(e),
    };

    if artifact.status == ArtifactStatus::Published {
        debug!(item_id = %item.id, "episode already published, skipping");
        return StageOutcome::Completed;
    }

    match generate_and_publish(ctx, item, text, &mut artifact).await {
        Ok(()) => StageOutcome::Completed,
        Err(e) => {
            // A settled artifact keeps its state; only in-flight work is
            // downgraded to Failed
            if !artifact.status.is_settled() {
                artifact.status = ArtifactStatus::Failed;
                artifact.error = Some(e.to_string());
            }
            if let Err(store_err) = ctx.store.upsert_audio(&artifact).await {
                warn!(item_id = %item.id, error = %store_err, "failed to persist audio failure");
            }
            warn!(item_id = %item.id, error = %e, "audio sub-pipeline failed");
            StageOutcome::fail(e)
        }
    }
}

async fn generate_and_publish(
    ctx: &StageCtx,
    item: &WorkItem,
    text: &TextArtifact,
    artifact: &mut AudioArtifact,
) -> Result<(), PipelineError> {
    if artifact.audio_url.is_none() {
        let in_flight = artifact.status == ArtifactStatus::Processing && artifact.job_id.is_some();

        let job_id = if in_flight {
            let id = artifact.job_id.clone().unwrap_or_default();
            debug!(item_id = %item.id, job_id = %id, "re-attaching to audio job");
            id
        } else {
            let script = build_script(text);
            let id = with_timeout(
                "audio.create_job",
                timeouts::JOB_CALL,
                ctx.clients.audio.create_job(&script, &text.title),
            )
            .await?;

            artifact.job_id = Some(id.clone());
            artifact.status = ArtifactStatus::Processing;
            ctx.store.upsert_audio(artifact).await?;
            id
        };

        let provider_url = poll_until(
            "audio.poll",
            timeouts::AUDIO_JOB,
            ctx.poll_interval,
            || async {
                let status = with_timeout(
                    "audio.poll",
                    timeouts::JOB_CALL,
                    ctx.clients.audio.poll_job(&job_id),
                )
                .await?;

                match status.state {
                    JobState::Ready => {
                        let url = status.audio_url.ok_or_else(|| {
                            PipelineError::provider("audio.poll", "job ready without audio_url")
                        })?;
                        Ok(Some(url))
                    }
                    JobState::Failed => Err(PipelineError::provider(
                        "audio.poll",
                        status.error.unwrap_or_else(|| "audio job failed".to_string()),
                    )),
                    _ => Ok(None),
                }
            },
        )
        .await?;

        // Take ownership of the file before the provider link expires
        let owned_url = if ctx.settings.storage.is_some() {
            let dest = format!("audio/{}.mp3", item.id);
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

        artifact.audio_url = Some(owned_url);
        artifact.status = ArtifactStatus::Ready;
        artifact.error = None;
        ctx.store.upsert_audio(artifact).await?;
    }

    if artifact.episode_id.is_none() {
        let episode = EpisodeDraft {
            title: text.title.clone(),
            description: text.excerpt.clone(),
            audio_url: artifact.audio_url.clone().unwrap_or_default(),
        };

        let published = with_timeout(
            "podcast.publish",
            timeouts::PODCAST_PUBLISH,
            ctx.clients.podcast.publish(&episode),
        )
        .await?;

        artifact.episode_id = Some(published.episode_id);
        artifact.episode_url = Some(published.url);
        artifact.player_url = Some(published.player_url);
        artifact.status = ArtifactStatus::Published;
        artifact.published_at = Some(Utc::now());
        ctx.store.upsert_audio(artifact).await?;

        info!(item_id = %item.id, "podcast episode published");
    }

    Ok(())
}

/// Narration script: title plus the article body with markup removed
fn build_script(text: &TextArtifact) -> String {
    format!("{}. {}", text.title, strip_tags(&text.body_html))
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
