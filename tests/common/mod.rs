//! Shared test harness: stub collaborators with call counters and an
//! in-memory store.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crier::clients::{
    AudioGenerator, AudioJobStatus, Clients, CmsClient, CreatedPost, EpisodeDraft,
    GeneratedArticle, GeneratedImage, ImageGenerator, JobState, NewPost, ObjectStorage,
    PodcastHost, PostPatch, PublishedEpisode, RemotePost, SocialClient, SocialPostReceipt,
    SocialPostRequest, StoredObject, TextGenerator, UploadedMedia, VideoGenerator, VideoJobStatus,
    VideoRequest,
};
use crier::config::{
    BusinessProfile, CmsCredentials, GenerationSettings, PodcastSettings, ServiceEndpoint,
    Settings, SocialAccount, SocialSettings, StaticSettings, VideoProviderSettings, VideoSettings,
};
use crier::core::{Orchestrator, RetryPolicy};
use crier::domain::{ImageAspect, TextArtifact, WorkItem};
use crier::store::{MemoryStore, Store};

pub fn sample_article() -> GeneratedArticle {
    GeneratedArticle {
        title: "Five Signs You Need a New Roof".to_string(),
        slug: "five-signs-you-need-a-new-roof".to_string(),
        body_html: "<p>Shingles curl before they fail.</p>".to_string(),
        excerpt: "Know the warning signs before the leak.".to_string(),
        meta_title: "Five Signs You Need a New Roof".to_string(),
        meta_description: "Warning signs your roof is failing.".to_string(),
    }
}

pub fn sample_text(item_id: Uuid) -> TextArtifact {
    TextArtifact::from_generated(item_id, sample_article())
}

#[derive(Default)]
pub struct StubText {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl TextGenerator for StubText {
    async fn generate(&self, _profile: &BusinessProfile, _topic: &str) -> Result<GeneratedArticle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            bail!("text provider unavailable");
        }
        Ok(sample_article())
    }
}

#[derive(Default)]
pub struct StubImage {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl ImageGenerator for StubImage {
    async fn generate(
        &self,
        _profile: &BusinessProfile,
        _topic: &str,
        aspect: ImageAspect,
    ) -> Result<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            bail!("image provider unavailable");
        }
        Ok(GeneratedImage {
            url: format!("https://images.example.com/{}.png", aspect.as_str()),
            width: 1024,
            height: 1024,
        })
    }
}

#[derive(Default)]
pub struct StubAudio {
    pub create_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl AudioGenerator for StubAudio {
    async fn create_job(&self, _script: &str, _title: &str) -> Result<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            bail!("audio service unavailable");
        }
        Ok("audio-job-1".to_string())
    }

    async fn poll_job(&self, job_id: &str) -> Result<AudioJobStatus> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AudioJobStatus {
            state: JobState::Ready,
            audio_url: Some(format!("https://tts.example.com/{}.mp3", job_id)),
            error: None,
        })
    }
}

pub struct StubVideo {
    name: String,
    pub create_calls: AtomicUsize,
    pub create_fail: AtomicBool,
}

impl StubVideo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            create_calls: AtomicUsize::new(0),
            create_fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl VideoGenerator for StubVideo {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_job(&self, _request: &VideoRequest) -> Result<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.create_fail.load(Ordering::SeqCst) {
            bail!("video provider at capacity");
        }
        Ok("video-job-1".to_string())
    }

    async fn poll_job(&self, job_id: &str) -> Result<VideoJobStatus> {
        Ok(VideoJobStatus {
            state: JobState::Ready,
            video_url: Some(format!("https://render.example.com/{}.mp4", job_id)),
            failed_reason: None,
        })
    }
}

#[derive(Default)]
pub struct StubCms {
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub fail_create: AtomicBool,
}

#[async_trait]
impl CmsClient for StubCms {
    async fn create_post(&self, _creds: &CmsCredentials, post: &NewPost) -> Result<CreatedPost> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            bail!("cms returned 502");
        }
        Ok(CreatedPost {
            id: "post-1".to_string(),
            url: format!("https://blog.example.com/{}", post.slug),
        })
    }

    async fn update_post(
        &self,
        _creds: &CmsCredentials,
        _id: &str,
        _patch: &PostPatch,
    ) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_post(&self, _creds: &CmsCredentials, _id: &str) -> Result<RemotePost> {
        Ok(RemotePost {
            content: "<p>Shingles curl before they fail.</p>".to_string(),
        })
    }

    async fn upload_media(
        &self,
        _creds: &CmsCredentials,
        _source_url: &str,
        _filename: &str,
    ) -> Result<UploadedMedia> {
        Ok(UploadedMedia {
            id: "media-1".to_string(),
        })
    }
}

#[derive(Default)]
pub struct StubSocial {
    pub calls: AtomicUsize,
    pub fail_platforms: Mutex<Vec<String>>,
}

#[async_trait]
impl SocialClient for StubSocial {
    async fn post(&self, request: &SocialPostRequest) -> Result<SocialPostReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failing = self.fail_platforms.lock().unwrap();
        if failing.iter().any(|p| p == &request.platform) {
            bail!("rate limited");
        }

        Ok(SocialPostReceipt {
            post_id: format!("{}-post-1", request.platform),
            status: "published".to_string(),
            published_url: Some(format!("https://{}.example.com/p/1", request.platform)),
            error: None,
        })
    }
}

#[derive(Default)]
pub struct StubPodcast {
    pub publish_calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl PodcastHost for StubPodcast {
    async fn publish(&self, _episode: &EpisodeDraft) -> Result<PublishedEpisode> {
        self.publish_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            bail!("podcast host unavailable");
        }
        Ok(PublishedEpisode {
            episode_id: "ep-1".to_string(),
            url: "https://pod.example.com/ep-1".to_string(),
            player_url: "https://pod.example.com/player/ep-1".to_string(),
        })
    }
}

#[derive(Default)]
pub struct StubStorage;

#[async_trait]
impl ObjectStorage for StubStorage {
    async fn upload_from_url(&self, _source_url: &str, dest_path: &str) -> Result<StoredObject> {
        Ok(StoredObject {
            url: format!("https://cdn.example.com/{}", dest_path),
        })
    }
}

/// Fully-configured pipeline with stub collaborators. Flip the stubs'
/// atomic flags (or edit `settings`) before calling `orchestrator()`.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub text: Arc<StubText>,
    pub image: Arc<StubImage>,
    pub audio: Arc<StubAudio>,
    pub video: Arc<StubVideo>,
    pub cms: Arc<StubCms>,
    pub social: Arc<StubSocial>,
    pub podcast: Arc<StubPodcast>,
    pub settings: Settings,
}

impl Harness {
    pub fn new() -> Self {
        let settings = Settings {
            business: BusinessProfile {
                name: "Hartley Roofing".to_string(),
                description: "Residential roofing in Madison, WI".to_string(),
                location: Some("Madison, WI".to_string()),
                website: Some("https://hartleyroofing.example".to_string()),
            },
            generation: GenerationSettings {
                endpoint: "https://gen.example.com".to_string(),
                api_key: "gen-key".to_string(),
                image_aspects: vec![ImageAspect::Landscape, ImageAspect::Square],
            },
            primary_cms: Some(CmsCredentials {
                endpoint: "https://cms.example.com/api".to_string(),
                api_key: "cms-key".to_string(),
                site_id: None,
            }),
            secondary_cms: None,
            audio: Some(ServiceEndpoint {
                endpoint: "https://tts.example.com".to_string(),
                api_key: "tts-key".to_string(),
            }),
            podcast: Some(PodcastSettings {
                endpoint: "https://pod.example.com".to_string(),
                api_key: "pod-key".to_string(),
                show_id: Some("show-1".to_string()),
            }),
            video: Some(VideoSettings {
                providers: vec![VideoProviderSettings {
                    name: "reelcraft".to_string(),
                    endpoint: "https://render.example.com".to_string(),
                    api_key: "render-key".to_string(),
                }],
            }),
            social: Some(SocialSettings {
                endpoint: "https://sched.example.com".to_string(),
                api_key: "sched-key".to_string(),
                accounts: vec![
                    SocialAccount {
                        platform: "facebook".to_string(),
                        account_id: "fb-1".to_string(),
                    },
                    SocialAccount {
                        platform: "instagram".to_string(),
                        account_id: "ig-1".to_string(),
                    },
                ],
            }),
            storage: None,
            retry: RetryPolicy {
                max_attempts: 3,
                initial_delay_ms: 1,
                max_delay_ms: 10,
                backoff_multiplier: 2.0,
            },
            poll_interval_secs: 0,
        };

        Self {
            store: Arc::new(MemoryStore::new()),
            text: Arc::new(StubText::default()),
            image: Arc::new(StubImage::default()),
            audio: Arc::new(StubAudio::default()),
            video: Arc::new(StubVideo::new("reelcraft")),
            cms: Arc::new(StubCms::default()),
            social: Arc::new(StubSocial::default()),
            podcast: Arc::new(StubPodcast::default()),
            settings,
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let clients = Clients {
            text: self.text.clone(),
            image: self.image.clone(),
            audio: self.audio.clone(),
            video: vec![self.video.clone() as Arc<dyn VideoGenerator>],
            cms: self.cms.clone(),
            storage: Arc::new(StubStorage),
            social: self.social.clone(),
            podcast: self.podcast.clone(),
        };

        Orchestrator::new(
            self.store.clone(),
            Arc::new(StaticSettings(self.settings.clone())),
            clients,
        )
    }

    pub async fn draft_item(&self, topic: &str) -> WorkItem {
        let item = WorkItem::new(Uuid::new_v4(), topic);
        self.store.create_item(&item).await.unwrap();
        item
    }
}
