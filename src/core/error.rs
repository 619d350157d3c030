//! Error taxonomy for the pipeline.
//!
//! `ConfigurationMissing` is deliberately absent: an unconfigured channel
//! is a skip signal, surfaced as `StageOutcome::Skipped` by the stage,
//! never as an error.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Errors surfaced by the orchestrator and resilience primitives
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An external call exceeded its per-call-kind deadline
    #[error("operation '{operation}' timed out after {limit:?}")]
    Timeout { operation: String, limit: Duration },

    /// A collaborator returned a failure
    #[error("provider error in '{operation}': {message}")]
    Provider { operation: String, message: String },

    #[error("work item {item_id} not found")]
    ItemNotFound { item_id: Uuid },

    /// The work item has no generated artifact the operation needs
    #[error("work item {item_id} has no {kind} artifact")]
    MissingArtifact { item_id: Uuid, kind: &'static str },

    /// The per-item retry ceiling was reached; distinct from per-call
    /// retry-with-backoff
    #[error("retry budget exhausted for work item {item_id} ({retry_count}/{ceiling})")]
    RetryExhausted {
        item_id: Uuid,
        retry_count: u32,
        ceiling: u32,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("settings unavailable: {0}")]
    Settings(String),
}

impl PipelineError {
    /// Provider error constructor used at stage boundaries
    pub fn provider(operation: &str, message: impl Into<String>) -> Self {
        Self::Provider {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}
