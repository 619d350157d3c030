//! Primary and secondary publish stages (non-critical).
//!
//! The primary destination receives the full article with hero image;
//! the secondary destination is a syndication copy. Both convert every
//! failure into a structured outcome instead of unwinding.

use tracing::{debug, info, warn};

use crate::clients::NewPost;
use crate::core::resilience::with_timeout;
use crate::domain::{AuditEntry, ImageArtifact, ImageAspect, TextArtifact, WorkItem};
use crate::store::Store;

use super::{audit, timeouts, StageCtx, StageOutcome};

/// Outcome of the primary publish stage, with the ids the downstream
/// stages need
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub outcome: StageOutcome,
    pub post_id: Option<String>,
    pub url: Option<String>,
}

pub async fn publish_primary(
    ctx: &StageCtx,
    item: &mut WorkItem,
    text: &mut TextArtifact,
    images: &[ImageArtifact],
) -> PublishResult {
    // Idempotent resumption: the post already exists
    if item.primary_published {
        debug!(item_id = %item.id, "primary post already published, skipping");
        return PublishResult {
            outcome: StageOutcome::Completed,
            post_id: item.primary_post_id.clone(),
            url: item.primary_url.clone(),
        };
    }

    let Some(creds) = ctx.settings.primary_cms.clone() else {
        audit(
            ctx,
            AuditEntry::skipped(item.id, "stage.publish_primary", "primary CMS not configured"),
        )
        .await;
        return PublishResult {
            outcome: StageOutcome::skip("primary CMS not configured"),
            post_id: None,
            url: None,
        };
    };

    audit(
        ctx,
        AuditEntry::started(item.id, "stage.publish_primary", format!("publishing '{}'", text.title)),
    )
    .await;

    // Hero upload failure is tolerated; the post goes out without it
    let mut hero_media_id = None;
    if let Some(hero) = images.iter().find(|i| i.aspect == ImageAspect::Landscape) {
        let filename = format!("{}-hero.png", text.slug);
        match with_timeout(
            "cms.upload_media",
            timeouts::MEDIA_UPLOAD,
            ctx.clients.cms.upload_media(&creds, &hero.url, &filename),
        )
        .await
        {
            Ok(media) => hero_media_id = Some(media.id),
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "hero image upload failed, publishing without it")
            }
        }
    }

    let post = NewPost {
        title: text.title.clone(),
        slug: text.slug.clone(),
        content: text.body_html.clone(),
        excerpt: text.excerpt.clone(),
        meta_title: text.meta_title.clone(),
        meta_description: text.meta_description.clone(),
        hero_media_id,
    };

    let created = with_timeout(
        "cms.create_post",
        timeouts::CMS_CALL,
        ctx.clients.cms.create_post(&creds, &post),
    )
    .await;

    match created {
        Ok(created) => {
            text.mark_published(created.id.clone(), created.url.clone());
            if let Err(e) = ctx.store.upsert_text(text).await {
                // The post exists; losing the metadata write must not fail
                // the stage, the next resumption re-reads item flags
                warn!(item_id = %item.id, error = %e, "failed to persist publication metadata");
            }
            item.mark_primary_published(created.id.clone(), created.url.clone());

            audit(
                ctx,
                AuditEntry::succeeded(item.id, "stage.publish_primary", created.url.clone()),
            )
            .await;
            info!(item_id = %item.id, url = %created.url, "primary post published");

            PublishResult {
                outcome: StageOutcome::Completed,
                post_id: Some(created.id),
                url: Some(created.url),
            }
        }
        Err(e) => {
            audit(
                ctx,
                AuditEntry::failed(item.id, "stage.publish_primary", e.to_string()),
            )
            .await;
            warn!(item_id = %item.id, error = %e, "primary publish failed, continuing");

            PublishResult {
                outcome: StageOutcome::fail(&e),
                post_id: None,
                url: None,
            }
        }
    }
}

pub async fn publish_secondary(
    ctx: &StageCtx,
    item: &mut WorkItem,
    text: &TextArtifact,
) -> StageOutcome {
    if item.secondary_published {
        debug!(item_id = %item.id, "secondary post already published, skipping");
        return StageOutcome::Completed;
    }

    let Some(creds) = ctx.settings.secondary_cms.clone() else {
        audit(
            ctx,
            AuditEntry::skipped(item.id, "stage.publish_secondary", "secondary CMS not configured"),
        )
        .await;
        return StageOutcome::skip("secondary CMS not configured");
    };

    audit(
        ctx,
        AuditEntry::started(item.id, "stage.publish_secondary", format!("syndicating '{}'", text.title)),
    )
    .await;

    let post = NewPost {
        title: text.title.clone(),
        slug: text.slug.clone(),
        content: text.body_html.clone(),
        excerpt: text.excerpt.clone(),
        meta_title: text.meta_title.clone(),
        meta_description: text.meta_description.clone(),
        hero_media_id: None,
    };

    match with_timeout(
        "cms.create_post.secondary",
        timeouts::CMS_CALL,
        ctx.clients.cms.create_post(&creds, &post),
    )
    .await
    {
        Ok(created) => {
            item.mark_secondary_published();
            audit(
                ctx,
                AuditEntry::succeeded(item.id, "stage.publish_secondary", created.url),
            )
            .await;
            StageOutcome::Completed
        }
        Err(e) => {
            audit(
                ctx,
                AuditEntry::failed(item.id, "stage.publish_secondary", e.to_string()),
            )
            .await;
            warn!(item_id = %item.id, error = %e, "secondary publish failed, continuing");
            StageOutcome::fail(&e)
        }
    }
}
