//! Command-line interface for crier.
//!
//! Provides commands for creating work items, running the pipeline,
//! retrying failed items, manually publishing reviewed items, and
//! inspecting state.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::clients::{
    AudioJobClient, Clients, GenerationClient, PodcastClient, RestCmsClient, SchedulerClient,
    StorageRelayClient, VideoGenerator, VideoJobClient,
};
use crate::config::{self, FileSettingsProvider, Settings, SettingsProvider};
use crate::core::Orchestrator;
use crate::domain::WorkItem;
use crate::store::{SqliteStore, Store};

/// crier - content marketing pipeline orchestrator
#[derive(Parser, Debug)]
#[command(name = "crier")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a draft work item for a topic
    Create {
        /// Topic to generate content for
        topic: String,

        /// Business id (defaults to a fresh id for single-tenant setups)
        #[arg(long)]
        business_id: Option<Uuid>,
    },

    /// Run the full pipeline for a work item
    Run {
        /// Work item id
        item_id: Uuid,
    },

    /// Retry a failed work item (rejected after 3 retries)
    Retry {
        /// Work item id
        item_id: Uuid,
    },

    /// Publish an item whose content was already generated
    Publish {
        /// Work item id
        item_id: Uuid,
    },

    /// Show the status of a work item
    Status {
        /// Work item id
        item_id: Uuid,

        /// Also print the audit log
        #[arg(long)]
        audit: bool,
    },

    /// List recent work items
    Items {
        /// Maximum number of items to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show resolved settings (credentials redacted)
    Config,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&config::db_path()?).context("Failed to open work item database")?,
        );
        let provider = Arc::new(FileSettingsProvider::open_default()?);

        match self.command {
            Commands::Create { topic, business_id } => {
                let item = WorkItem::new(business_id.unwrap_or_else(Uuid::new_v4), topic);
                store.create_item(&item).await?;
                println!("Created work item {}", item.id);
                println!("  topic: {}", item.topic);
            }

            Commands::Run { item_id } => {
                let orchestrator = build_orchestrator(store, provider).await?;
                let item = orchestrator.run(item_id).await?;
                print_item(&item);
            }

            Commands::Retry { item_id } => {
                let orchestrator = build_orchestrator(store, provider).await?;
                let item = orchestrator.retry(item_id).await?;
                print_item(&item);
            }

            Commands::Publish { item_id } => {
                let orchestrator = build_orchestrator(store, provider).await?;
                let item = orchestrator.publish(item_id).await?;
                print_item(&item);
            }

            Commands::Status { item_id, audit } => {
                let item = store
                    .find_item(item_id)
                    .await?
                    .with_context(|| format!("Work item {} not found", item_id))?;
                print_item(&item);

                if audit {
                    println!("\nAudit log:");
                    for entry in store.list_audit(item_id).await? {
                        println!(
                            "  {} {:?} {} {}",
                            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                            entry.outcome,
                            entry.action,
                            entry.error.as_deref().unwrap_or(&entry.detail),
                        );
                    }
                }
            }

            Commands::Items { limit } => {
                let items = store.list_items(limit).await?;
                if items.is_empty() {
                    println!("No work items yet. Create one with `crier create <topic>`.");
                }
                for item in items {
                    println!(
                        "{}  {:<10}  {}",
                        item.id,
                        item.status.as_str(),
                        item.topic
                    );
                }
            }

            Commands::Config => {
                let settings = provider.settings().await?;
                print_settings(&settings);
            }
        }

        Ok(())
    }
}

/// Build the orchestrator with reqwest-backed clients from settings
async fn build_orchestrator(
    store: Arc<dyn Store>,
    provider: Arc<FileSettingsProvider>,
) -> Result<Orchestrator> {
    let settings = provider.settings().await?;
    let clients = build_clients(&settings);
    Ok(Orchestrator::new(store, provider, clients))
}

fn build_clients(settings: &Settings) -> Clients {
    let generation = Arc::new(GenerationClient::new(&settings.generation));

    let video: Vec<Arc<dyn VideoGenerator>> = settings
        .video
        .iter()
        .flat_map(|v| v.providers.iter())
        .map(|p| Arc::new(VideoJobClient::new(p)) as Arc<dyn VideoGenerator>)
        .collect();

    Clients {
        text: generation.clone(),
        image: generation,
        audio: Arc::new(AudioJobClient::new(
            &settings.audio.clone().unwrap_or_default(),
        )),
        video,
        cms: Arc::new(RestCmsClient::new()),
        storage: Arc::new(StorageRelayClient::new(
            &settings.storage.clone().unwrap_or_default(),
        )),
        social: Arc::new(SchedulerClient::new(
            &settings.social.clone().unwrap_or_default(),
        )),
        podcast: Arc::new(PodcastClient::new(
            &settings.podcast.clone().unwrap_or_default(),
        )),
    }
}

fn print_item(item: &WorkItem) {
    println!("Work item {}", item.id);
    println!("  topic:    {}", item.topic);
    println!("  status:   {}", item.status.as_str());
    if let Some(stage) = &item.current_stage {
        println!("  stage:    {}", stage);
    }
    println!("  retries:  {}", item.retry_count);
    if let Some(error) = &item.last_error {
        println!("  error:    {}", error);
    }
    if let Some(url) = &item.primary_url {
        println!("  post:     {}", url);
    }
    println!(
        "  channels: primary={} secondary={} audio={} video={} social={} metadata={}",
        item.primary_published,
        item.secondary_published,
        item.audio_generated,
        item.video_generated,
        item.social_distributed,
        item.metadata_embedded,
    );
}

fn print_settings(settings: &Settings) {
    println!("business: {}", settings.business.name);
    println!(
        "generation: {} ({} aspect(s))",
        redact_endpoint(&settings.generation.endpoint),
        settings.generation.image_aspects.len()
    );
    println!(
        "primary_cms: {}",
        settings
            .primary_cms
            .as_ref()
            .map(|c| redact_endpoint(&c.endpoint))
            .unwrap_or_else(|| "not configured".to_string())
    );
    println!(
        "secondary_cms: {}",
        settings
            .secondary_cms
            .as_ref()
            .map(|c| redact_endpoint(&c.endpoint))
            .unwrap_or_else(|| "not configured".to_string())
    );
    println!(
        "podcast: {}",
        settings
            .podcast
            .as_ref()
            .map(|p| redact_endpoint(&p.endpoint))
            .unwrap_or_else(|| "not configured".to_string())
    );
    println!(
        "video providers: {}",
        settings
            .video
            .as_ref()
            .map(|v| v
                .providers
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", "))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "not configured".to_string())
    );
    println!(
        "social accounts: {}",
        settings
            .social
            .as_ref()
            .map(|s| s
                .accounts
                .iter()
                .map(|a| a.platform.as_str())
                .collect::<Vec<_>>()
                .join(", "))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "not configured".to_string())
    );
    println!(
        "retry: {} attempts, {}ms initial delay",
        settings.retry.max_attempts, settings.retry.initial_delay_ms
    );
    println!("poll interval: {}s", settings.poll_interval_secs);
}

fn redact_endpoint(endpoint: &str) -> String {
    if endpoint.is_empty() {
        "not configured".to_string()
    } else {
        endpoint.to_string()
    }
}
