//! Settings and credentials for the pipeline.
//!
//! Settings are injected into the orchestrator at construction behind the
//! `SettingsProvider` trait; callers never reach for global state. The
//! file-backed provider caches the parsed file with a TTL so a run does
//! not re-read it on every lookup.
//!
//! Sources (highest priority first):
//! 1. Environment variable (CRIER_HOME)
//! 2. Settings file ($CRIER_HOME/settings.yaml)
//! 3. Defaults (~/.crier)

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::resilience::RetryPolicy;
use crate::domain::ImageAspect;

/// Get the crier home directory (engine state)
pub fn crier_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("CRIER_HOME") {
        return Ok(PathBuf::from(home));
    }

    Ok(dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".crier"))
}

/// Path to the settings file ($CRIER_HOME/settings.yaml)
pub fn settings_path() -> Result<PathBuf> {
    Ok(crier_home()?.join("settings.yaml"))
}

/// Path to the sqlite database ($CRIER_HOME/crier.db)
pub fn db_path() -> Result<PathBuf> {
    Ok(crier_home()?.join("crier.db"))
}

/// The business the content is generated for
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    pub description: String,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub website: Option<String>,
}

/// Content generation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub api_key: String,

    /// Aspect ratios to generate images at
    #[serde(default = "default_aspects")]
    pub image_aspects: Vec<ImageAspect>,
}

fn default_aspects() -> Vec<ImageAspect> {
    vec![ImageAspect::Landscape, ImageAspect::Square]
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            image_aspects: default_aspects(),
        }
    }
}

/// Credentials for one CMS destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsCredentials {
    pub endpoint: String,
    pub api_key: String,

    #[serde(default)]
    pub site_id: Option<String>,
}

/// Endpoint + key pair for a simple JSON service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub endpoint: String,
    pub api_key: String,
}

/// Podcast host settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodcastSettings {
    pub endpoint: String,
    pub api_key: String,

    #[serde(default)]
    pub show_id: Option<String>,
}

/// Video generation settings: an ordered provider fallback chain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoSettings {
    pub providers: Vec<VideoProviderSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoProviderSettings {
    pub name: String,
    pub endpoint: String,
    pub api_key: String,
}

/// Social scheduler settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialSettings {
    pub endpoint: String,
    pub api_key: String,

    #[serde(default)]
    pub accounts: Vec<SocialAccount>,
}

/// One connected social account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialAccount {
    pub platform: String,
    pub account_id: String,
}

/// Object storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    pub endpoint: String,
    pub api_key: String,

    #[serde(default)]
    pub bucket: Option<String>,
}

/// Full resolved settings for a pipeline run.
///
/// Every channel section is optional; a missing section means the
/// corresponding stage is skipped, not failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub business: BusinessProfile,

    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub primary_cms: Option<CmsCredentials>,

    #[serde(default)]
    pub secondary_cms: Option<CmsCredentials>,

    #[serde(default)]
    pub audio: Option<ServiceEndpoint>,

    #[serde(default)]
    pub podcast: Option<PodcastSettings>,

    #[serde(default)]
    pub video: Option<VideoSettings>,

    #[serde(default)]
    pub social: Option<SocialSettings>,

    #[serde(default)]
    pub storage: Option<StorageSettings>,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Seconds between polls of an async provider job
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            business: BusinessProfile::default(),
            generation: GenerationSettings::default(),
            primary_cms: None,
            secondary_cms: None,
            audio: None,
            podcast: None,
            video: None,
            social: None,
            storage: None,
            retry: RetryPolicy::default(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Source of settings/credentials, injected into the orchestrator
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn settings(&self) -> Result<Settings>;
}

/// File-backed provider with a TTL cache.
///
/// The parsed file is cached for `ttl`; `invalidate` drops the cache so
/// the next lookup re-reads the file.
pub struct FileSettingsProvider {
    path: PathBuf,
    ttl: Duration,
    cache: RwLock<Option<CachedSettings>>,
}

struct CachedSettings {
    loaded_at: Instant,
    settings: Settings,
}

impl FileSettingsProvider {
    pub fn new(path: PathBuf, ttl: Duration) -> Self {
        Self {
            path,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Open the provider at the default settings path with a 5 minute TTL
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(settings_path()?, Duration::from_secs(300)))
    }

    /// Drop the cached settings
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn load(&self) -> Result<Settings> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", self.path.display()))
    }
}

#[async_trait]
impl SettingsProvider for FileSettingsProvider {
    async fn settings(&self) -> Result<Settings> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_at.elapsed() < self.ttl {
                    return Ok(cached.settings.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(cached.settings.clone());
            }
        }

        let settings = self.load().await?;
        *cache = Some(CachedSettings {
            loaded_at: Instant::now(),
            settings: settings.clone(),
        });

        Ok(settings)
    }
}

/// Fixed in-memory settings, used in tests
pub struct StaticSettings(pub Settings);

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn settings(&self) -> Result<Settings> {
        Ok(self.0.clone())
    }
}
