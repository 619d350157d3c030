//! Social distribution across configured platforms.
//!
//! Each platform is isolated in its own attempt: one platform's failure
//! (rate limit, expired token) is recorded as a `Failed` post record and
//! the remaining platforms still run.

use tracing::{debug, warn};

use crate::clients::SocialPostRequest;
use crate::core::resilience::with_timeout;
use crate::domain::{social_dedup_key, ImageArtifact, ImageAspect, SocialPost, TextArtifact, WorkItem};
use crate::store::Store;

use super::{timeouts, StageCtx, StageOutcome};

pub async fn distribute_social(
    ctx: &StageCtx,
    item: &WorkItem,
    text: &TextArtifact,
    images: &[ImageArtifact],
) -> StageOutcome {
    let Some(social) = &ctx.settings.social else {
        return StageOutcome::skip("social scheduler not configured");
    };
    if social.accounts.is_empty() {
        return StageOutcome::skip("no social accounts connected");
    }

    let existing = match ctx.store.list_social_posts(item.id).await {
        Ok(posts) => posts,
        Err(e) => return StageOutcome::fail(e),
    };

    let caption = build_caption(text, item.primary_url.as_deref());
    let media_url = images
        .iter()
        .find(|i| i.aspect == ImageAspect::Square)
        .map(|i| i.url.clone());

    let mut published = 0usize;
    let mut failures: Vec<String> = Vec::new();

    for account in &social.accounts {
        let key = social_dedup_key(item.id, &account.platform);
        if existing
            .iter()
            .any(|p| p.dedup_key == key && p.status.is_settled())
        {
            debug!(item_id = %item.id, platform = %account.platform, "post exists, skipping");
            published += 1;
            continue;
        }

        let mut post = SocialPost::new(item.id, &account.platform, caption.clone());
        let request = SocialPostRequest {
            account_id: account.account_id.clone(),
            platform: account.platform.clone(),
            caption: caption.clone(),
            media_url: media_url.clone(),
            scheduled_time: None,
        };

        match with_timeout(
            "social.post",
            timeouts::SOCIAL_POST,
            ctx.clients.social.post(&request),
        )
        .await
        {
            Ok(receipt) if receipt.error.is_none() => {
                post.mark_published(receipt.post_id, receipt.published_url);
                published += 1;
            }
            Ok(receipt) => {
                let reason = receipt
                    .error
                    .unwrap_or_else(|| "scheduler reported failure".to_string());
                warn!(platform = %account.platform, reason = %reason, "social post failed");
                post.mark_failed(reason.clone());
                failures.push(format!("{}: {}", account.platform, reason));
            }
            Err(e) => {
                warn!(platform = %account.platform, error = %e, "social post failed");
                post.mark_failed(e.to_string());
                failures.push(format!("{}: {}", account.platform, e));
            }
        }

        if let Err(e) = ctx.store.upsert_social_post(&post).await {
            warn!(platform = %account.platform, error = %e, "failed to persist social post record");
        }
    }

    if published > 0 {
        // Per-platform failures are already recorded on their post records
        StageOutcome::Completed
    } else {
        StageOutcome::fail(failures.join("; "))
    }
}

fn build_caption(text: &TextArtifact, article_url: Option<&str>) -> String {
    match article_url {
        Some(url) => format!("{}\n\n{}\n\nRead more: {}", text.title, text.excerpt, url),
        None => format!("{}\n\n{}", text.title, text.excerpt),
    }
}
