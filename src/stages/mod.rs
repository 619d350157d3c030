//! Pipeline stage implementations.
//!
//! Generation-class stages (text, images) are critical: failure after
//! retries aborts the run. Distribution-class stages (publish, audio,
//! video, social, finalize) catch every failure at their boundary and
//! report a structured `StageOutcome` instead.

pub mod audio;
pub mod embed;
pub mod finalize;
pub mod images;
pub mod publish;
pub mod social;
pub mod text;
pub mod video;

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::clients::Clients;
use crate::config::Settings;
use crate::core::resilience::RetryPolicy;
use crate::domain::AuditEntry;
use crate::store::Store;

/// Everything a stage needs: persistence, collaborators, and the
/// settings snapshot resolved at the start of the run
pub struct StageCtx {
    pub store: Arc<dyn Store>,
    pub clients: Clients,
    pub settings: Settings,
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
}

/// Result of a non-critical stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,

    /// Channel not configured; recorded distinctly so it does not count
    /// against final-status computation as a failure
    Skipped { reason: String },

    Failed { error: String },
}

impl StageOutcome {
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn fail(error: impl ToString) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Best-effort audit write. The audit log is a side channel for
/// operators; its absence must never affect pipeline control flow.
pub(crate) async fn audit(ctx: &StageCtx, entry: AuditEntry) {
    if let Err(e) = ctx.store.append_audit(&entry).await {
        warn!(action = %entry.action, error = %e, "audit write failed");
    }
}

/// Per-call-kind deadlines. Every external call in every stage goes
/// through one of these; there is no call without a bounded wait.
pub mod timeouts {
    use std::time::Duration;

    pub const TEXT_GENERATE: Duration = Duration::from_secs(120);
    pub const IMAGE_GENERATE: Duration = Duration::from_secs(90);

    /// Single CMS round trip (create/update/get)
    pub const CMS_CALL: Duration = Duration::from_secs(60);
    pub const MEDIA_UPLOAD: Duration = Duration::from_secs(120);

    /// Single create/poll call on an async job API
    pub const JOB_CALL: Duration = Duration::from_secs(30);

    /// End-to-end bound for the audio sub-pipeline's job polling
    pub const AUDIO_JOB: Duration = Duration::from_secs(600);

    /// End-to-end bound for the video sub-pipeline's job polling
    pub const VIDEO_JOB: Duration = Duration::from_secs(900);

    pub const STORAGE_UPLOAD: Duration = Duration::from_secs(120);
    pub const PODCAST_PUBLISH: Duration = Duration::from_secs(60);
    pub const SOCIAL_POST: Duration = Duration::from_secs(45);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        assert!(StageOutcome::Completed.succeeded());
        assert!(!StageOutcome::Completed.failed());

        let skipped = StageOutcome::skip("not configured");
        assert!(!skipped.succeeded());
        assert!(!skipped.failed());
        assert!(skipped.error().is_none());

        let failed = StageOutcome::fail("boom");
        assert!(failed.failed());
        assert_eq!(failed.error(), Some("boom"));
    }
}
