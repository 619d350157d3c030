//! Distribution Integration Tests
//!
//! Fan-out/fan-in behavior of the parallel stage coordinator, per-platform
//! isolation within social distribution, and job re-attachment.

mod common;

use std::sync::atomic::Ordering::SeqCst;

use common::Harness;
use crier::config::SocialAccount;
use crier::domain::{ArtifactStatus, AudioArtifact, ItemStatus};
use crier::store::Store;

#[tokio::test]
async fn video_failure_does_not_block_audio_and_social() {
    let h = Harness::new();
    h.video.create_fail.store(true, SeqCst);
    let item = h.draft_item("kitchen remodel timelines").await;

    // The run settles without an error despite the rejected sub-pipeline
    let done = h.orchestrator().run(item.id).await.unwrap();

    assert!(done.audio_generated);
    assert!(done.social_distributed);
    assert!(!done.video_generated);
    assert_eq!(done.status, ItemStatus::Published);

    let video = h.store.find_video(item.id).await.unwrap().unwrap();
    assert_eq!(video.status, ArtifactStatus::Failed);
    assert!(video.error.is_some());
}

#[tokio::test]
async fn one_platform_failure_does_not_stop_the_rest() {
    let mut h = Harness::new();
    if let Some(social) = h.settings.social.as_mut() {
        social.accounts.push(SocialAccount {
            platform: "linkedin".to_string(),
            account_id: "li-1".to_string(),
        });
    }
    h.social
        .fail_platforms
        .lock()
        .unwrap()
        .push("instagram".to_string());

    let item = h.draft_item("topic").await;
    let done = h.orchestrator().run(item.id).await.unwrap();

    // All three platforms were attempted, no early abort
    assert_eq!(h.social.calls.load(SeqCst), 3);
    assert!(done.social_distributed);

    let posts = h.store.list_social_posts(item.id).await.unwrap();
    assert_eq!(posts.len(), 3);

    let failed = posts.iter().find(|p| p.platform == "instagram").unwrap();
    assert_eq!(failed.status, ArtifactStatus::Failed);
    assert!(failed.error.as_ref().unwrap().contains("rate limited"));
    assert!(failed.post_id.is_none());

    for platform in ["facebook", "linkedin"] {
        let post = posts.iter().find(|p| p.platform == platform).unwrap();
        assert_eq!(post.status, ArtifactStatus::Published);
        assert!(post.post_id.is_some());
    }
}

#[tokio::test]
async fn all_platforms_failing_marks_the_sub_pipeline_failed() {
    let h = Harness::new();
    {
        let mut failing = h.social.fail_platforms.lock().unwrap();
        failing.push("facebook".to_string());
        failing.push("instagram".to_string());
    }

    let item = h.draft_item("topic").await;
    let done = h.orchestrator().run(item.id).await.unwrap();

    assert!(!done.social_distributed);
    assert_eq!(done.status, ItemStatus::Published);

    let posts = h.store.list_social_posts(item.id).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.status == ArtifactStatus::Failed));
}

#[tokio::test]
async fn unconfigured_channels_are_skipped_not_failed() {
    let mut h = Harness::new();
    h.settings.podcast = None;
    h.settings.video = None;
    h.settings.social = None;

    let item = h.draft_item("topic").await;
    let done = h.orchestrator().run(item.id).await.unwrap();

    // Skips never demote the outcome
    assert_eq!(done.status, ItemStatus::Published);
    assert!(!done.audio_generated);
    assert!(!done.video_generated);
    assert!(!done.social_distributed);

    assert_eq!(h.audio.create_calls.load(SeqCst), 0);
    assert_eq!(h.video.create_calls.load(SeqCst), 0);
    assert_eq!(h.social.calls.load(SeqCst), 0);
}

#[tokio::test]
async fn processing_audio_artifact_reattaches_instead_of_duplicating() {
    let h = Harness::new();
    let item = h.draft_item("topic").await;

    // A prior run crashed mid-flight: the job exists, the episode does not
    let mut stranded = AudioArtifact::pending(item.id);
    stranded.job_id = Some("audio-job-7".to_string());
    stranded.status = ArtifactStatus::Processing;
    h.store.upsert_audio(&stranded).await.unwrap();

    let done = h.orchestrator().run(item.id).await.unwrap();

    // Re-attached: polled the existing job, never created a second one
    assert_eq!(h.audio.create_calls.load(SeqCst), 0);
    assert!(h.audio.poll_calls.load(SeqCst) >= 1);
    assert!(done.audio_generated);

    let audio = h.store.find_audio(item.id).await.unwrap().unwrap();
    assert_eq!(audio.status, ArtifactStatus::Published);
    assert_eq!(audio.job_id.as_deref(), Some("audio-job-7"));
    assert!(audio.episode_id.is_some());
    assert!(audio
        .audio_url
        .as_ref()
        .unwrap()
        .contains("audio-job-7"));
}

#[tokio::test]
async fn podcast_publish_failure_keeps_ready_audio() {
    let h = Harness::new();
    h.podcast.fail.store(true, SeqCst);

    let item = h.draft_item("topic").await;
    let done = h.orchestrator().run(item.id).await.unwrap();

    assert!(!done.audio_generated);
    assert_eq!(done.status, ItemStatus::Published);

    // The generated audio survives for the next retry; only the episode
    // publish is outstanding
    let audio = h.store.find_audio(item.id).await.unwrap().unwrap();
    assert_eq!(audio.status, ArtifactStatus::Ready);
    assert!(audio.audio_url.is_some());
    assert!(audio.episode_id.is_none());
}
