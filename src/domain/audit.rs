//! Append-only audit log entries.
//!
//! One entry is written per attempted action (started, succeeded, failed,
//! skipped). The orchestrator never reads these back for decision-making;
//! they exist for operators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable audit record for one attempted action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// The work item this entry belongs to
    pub item_id: Uuid,

    /// Action label, e.g. "stage.text" or "distribution.social"
    pub action: String,

    pub outcome: AuditOutcome,

    /// Human-readable summary (no secrets)
    pub detail: String,

    /// Raw error message if the action failed
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    fn new(item_id: Uuid, action: &str, outcome: AuditOutcome, detail: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            action: action.to_string(),
            outcome,
            detail: detail.into(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn started(item_id: Uuid, action: &str, detail: impl Into<String>) -> Self {
        Self::new(item_id, action, AuditOutcome::Started, detail)
    }

    pub fn succeeded(item_id: Uuid, action: &str, detail: impl Into<String>) -> Self {
        Self::new(item_id, action, AuditOutcome::Succeeded, detail)
    }

    pub fn failed(item_id: Uuid, action: &str, error: impl Into<String>) -> Self {
        let error = error.into();
        let mut entry = Self::new(item_id, action, AuditOutcome::Failed, "action failed");
        entry.error = Some(error);
        entry
    }

    pub fn skipped(item_id: Uuid, action: &str, reason: impl Into<String>) -> Self {
        Self::new(item_id, action, AuditOutcome::Skipped, reason)
    }
}

/// Outcome recorded for an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Started,
    Succeeded,
    Failed,

    /// Action skipped, e.g. channel not configured
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_entry_carries_error() {
        let entry = AuditEntry::failed(Uuid::new_v4(), "stage.text", "provider 503");

        assert_eq!(entry.outcome, AuditOutcome::Failed);
        assert_eq!(entry.error.as_deref(), Some("provider 503"));
    }

    #[test]
    fn test_entry_serialization() {
        let entry = AuditEntry::started(Uuid::new_v4(), "pipeline.run", "run started");

        let json = serde_json::to_string(&entry).unwrap();
        let parsed: AuditEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.action, "pipeline.run");
        assert_eq!(parsed.outcome, AuditOutcome::Started);
    }
}
