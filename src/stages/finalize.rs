//! Finalization: schema markup and cross-embedding of audio/video links
//! back into the primary published post (non-critical).
//!
//! Runs after distribution settles so the embeds reference whatever
//! media actually exists.

use tracing::{debug, info, warn};

use crate::clients::PostPatch;
use crate::config::CmsCredentials;
use crate::core::error::PipelineError;
use crate::core::resilience::with_timeout;
use crate::domain::{AuditEntry, TextArtifact, WorkItem};
use crate::store::Store;

use super::embed::{audio_player_embed, insert_embed, schema_markup, video_embed};
use super::{audit, timeouts, StageCtx, StageOutcome};

pub async fn finalize(ctx: &StageCtx, item: &mut WorkItem, text: &TextArtifact) -> StageOutcome {
    if item.metadata_embedded {
        debug!(item_id = %item.id, "metadata already embedded, skipping");
        return StageOutcome::Completed;
    }

    let (Some(post_id), Some(creds)) = (
        item.primary_post_id.clone(),
        ctx.settings.primary_cms.clone(),
    ) else {
        audit(
            ctx,
            AuditEntry::skipped(item.id, "stage.finalize", "no primary post to finalize"),
        )
        .await;
        return StageOutcome::skip("no primary post to finalize");
    };

    audit(
        ctx,
        AuditEntry::started(item.id, "stage.finalize", "embedding metadata and media"),
    )
    .await;

    match embed_into_post(ctx, item, text, &post_id, &creds).await {
        Ok(()) => {
            item.mark_metadata_embedded();
            audit(
                ctx,
                AuditEntry::succeeded(item.id, "stage.finalize", "metadata embedded"),
            )
            .await;
            info!(item_id = %item.id, "post finalized");
            StageOutcome::Completed
        }
        Err(e) => {
            audit(ctx, AuditEntry::failed(item.id, "stage.finalize", e.to_string())).await;
            warn!(item_id = %item.id, error = %e, "finalization failed, continuing");
            StageOutcome::fail(e)
        }
    }
}

async fn embed_into_post(
    ctx: &StageCtx,
    item: &WorkItem,
    text: &TextArtifact,
    post_id: &str,
    creds: &CmsCredentials,
) -> Result<(), PipelineError> {
    let remote = with_timeout(
        "cms.get_post",
        timeouts::CMS_CALL,
        ctx.clients.cms.get_post(creds, post_id),
    )
    .await?;

    let mut content = remote.content;

    if let Some(audio) = ctx.store.find_audio(item.id).await? {
        if let Some(player_url) = &audio.player_url {
            content = insert_embed(&content, "audio", &audio_player_embed(player_url));
        }
    }

    if let Some(video) = ctx.store.find_video(item.id).await? {
        if let Some(video_url) = &video.video_url {
            content = insert_embed(&content, "video", &video_embed(video_url));
        }
    }

    content = insert_embed(
        &content,
        "schema",
        &schema_markup(text, &ctx.settings.business, item.primary_url.as_deref()),
    );

    with_timeout(
        "cms.update_post",
        timeouts::CMS_CALL,
        ctx.clients.cms.update_post(
            creds,
            post_id,
            &PostPatch {
                content: Some(content),
            },
        ),
    )
    .await?;

    Ok(())
}
