//! crier - content marketing pipeline orchestrator
//!
//! A Rust orchestrator that turns a topic into a blog article, images, a
//! podcast episode, a short video, and social posts, then publishes them
//! across external channels.
//!
//! # Architecture
//!
//! The pipeline is a resumable state machine:
//! - Generation stages (text, images) are critical and sequential
//! - Publishing and distribution stages are non-critical; failures are
//!   recorded per channel, never unwound
//! - Distribution sub-pipelines (audio, video, social) fan out
//!   concurrently and join on settled results
//! - Every stage checks for its own artifact before calling out, so
//!   re-running a partially-completed item repeats no side effects
//!
//! # Modules
//!
//! - `clients`: collaborator traits + reqwest clients for external services
//! - `core`: orchestration logic (Orchestrator, Coordinator, Resilience)
//! - `domain`: data structures (WorkItem, artifacts, audit entries)
//! - `stages`: stage implementations
//! - `store`: persistence (sqlite, in-memory)
//! - `config`: injected settings/credentials provider
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Create and run a work item
//! crier create "fall gutter cleaning specials"
//! crier run <item-id>
//!
//! # Retry after a failure
//! crier retry <item-id>
//!
//! # Manually publish reviewed content
//! crier publish <item-id>
//! ```

pub mod cli;
pub mod clients;
pub mod config;
pub mod core;
pub mod domain;
pub mod stages;
pub mod store;

// Re-export main types at crate root for convenience
pub use crate::core::{Orchestrator, PipelineError, RetryPolicy, RETRY_CEILING};
pub use config::{Settings, SettingsProvider};
pub use domain::{ArtifactStatus, ItemStatus, WorkItem};
pub use stages::StageOutcome;
pub use store::{MemoryStore, SqliteStore, Store};
