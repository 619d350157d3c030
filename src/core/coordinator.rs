//! Parallel stage coordinator: distribution fan-out/fan-in.
//!
//! The audio, video and social sub-pipelines run concurrently against the
//! same work item and mutate disjoint channel flags. The coordinator
//! waits for all three to settle; one sub-pipeline's failure never
//! cancels the others.

use tracing::info;

use crate::domain::{AuditEntry, ImageArtifact, TextArtifact, WorkItem};
use crate::stages::{self, audit, StageCtx, StageOutcome};

/// Settled results of the three distribution sub-pipelines
#[derive(Debug, Clone)]
pub struct DistributionReport {
    pub audio: StageOutcome,
    pub video: StageOutcome,
    pub social: StageOutcome,
}

impl DistributionReport {
    pub fn any_failed(&self) -> bool {
        self.audio.failed() || self.video.failed() || self.social.failed()
    }
}

/// Run the distribution sub-pipelines concurrently and aggregate their
/// settled outcomes into the work item's channel flags.
pub async fn distribute(
    ctx: &StageCtx,
    item: &mut WorkItem,
    text: &TextArtifact,
    images: &[ImageArtifact],
) -> DistributionReport {
    info!(item_id = %item.id, "starting distribution fan-out");

    // Sub-pipelines read a snapshot; flags are applied after the join so
    // no two paths touch the same field
    let snapshot = item.clone();

    let (audio, video, social) = tokio::join!(
        stages::audio::run_audio(ctx, &snapshot, text),
        stages::video::run_video(ctx, &snapshot, text, images),
        stages::social::distribute_social(ctx, &snapshot, text, images),
    );

    if audio.succeeded() && !item.audio_generated {
        item.mark_audio_generated();
    }
    if video.succeeded() && !item.video_generated {
        item.mark_video_generated();
    }
    if social.succeeded() && !item.social_distributed {
        item.mark_social_distributed();
    }

    // One audit entry per sub-pipeline
    for (action, outcome) in [
        ("distribution.audio", &audio),
        ("distribution.video", &video),
        ("distribution.social", &social),
    ] {
        let entry = match outcome {
            StageOutcome::Completed => {
                AuditEntry::succeeded(item.id, action, "sub-pipeline settled")
            }
            StageOutcome::Skipped { reason } => AuditEntry::skipped(item.id, action, reason.clone()),
            StageOutcome::Failed { error } => AuditEntry::failed(item.id, action, error.clone()),
        };
        audit(ctx, entry).await;
    }

    info!(
        item_id = %item.id,
        audio = audio.succeeded(),
        video = video.succeeded(),
        social = social.succeeded(),
        "distribution settled"
    );

    DistributionReport {
        audio,
        video,
        social,
    }
}
