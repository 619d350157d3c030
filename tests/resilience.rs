//! Resilience Primitive Tests
//!
//! Timeout bounding and retry-with-backoff behavior, run against a paused
//! clock so delays are exact.

use std::future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crier::core::{with_retry, with_timeout, PipelineError, RetryPolicy};

#[tokio::test(start_paused = true)]
async fn timeout_surfaces_within_bound() {
    let start = Instant::now();

    // The inner future never resolves
    let result: Result<(), PipelineError> = with_timeout(
        "slow.op",
        Duration::from_millis(50),
        future::pending::<anyhow::Result<()>>(),
    )
    .await;

    let elapsed = start.elapsed();

    match result {
        Err(PipelineError::Timeout { operation, limit }) => {
            assert_eq!(operation, "slow.op");
            assert_eq!(limit, Duration::from_millis(50));
        }
        other => panic!("expected timeout, got {:?}", other),
    }

    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(100));
}

#[tokio::test]
async fn timeout_passes_through_success() {
    let value = with_timeout("fast.op", Duration::from_secs(1), async { Ok(7) })
        .await
        .unwrap();
    assert_eq!(value, 7);
}

#[tokio::test]
async fn timeout_maps_collaborator_failure_to_provider_error() {
    let result: Result<(), PipelineError> =
        with_timeout("op", Duration::from_secs(1), async { anyhow::bail!("503") }).await;

    match result {
        Err(PipelineError::Provider { operation, message }) => {
            assert_eq!(operation, "op");
            assert!(message.contains("503"));
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn retry_recovers_with_strictly_increasing_delays() {
    let attempts = AtomicUsize::new(0);
    let stamps: Mutex<Vec<Instant>> = Mutex::new(Vec::new());
    let policy = RetryPolicy {
        max_attempts: 3,
        initial_delay_ms: 100,
        max_delay_ms: 10_000,
        backoff_multiplier: 2.0,
    };

    let value = with_retry("flaky.op", &policy, || {
        stamps.lock().unwrap().push(Instant::now());
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if attempt < 3 {
                Err(PipelineError::provider("flaky.op", "transient"))
            } else {
                Ok(99)
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(value, 99);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    let stamps = stamps.into_inner().unwrap();
    assert_eq!(stamps.len(), 3);

    let first_gap = stamps[1] - stamps[0];
    let second_gap = stamps[2] - stamps[1];
    assert!(first_gap >= Duration::from_millis(100));
    assert!(second_gap > first_gap);
}

#[tokio::test(start_paused = true)]
async fn retry_surfaces_final_error_after_exhaustion() {
    let attempts = AtomicUsize::new(0);
    let policy = RetryPolicy {
        max_attempts: 3,
        initial_delay_ms: 10,
        max_delay_ms: 100,
        backoff_multiplier: 2.0,
    };

    let result: Result<(), PipelineError> = with_retry("doomed.op", &policy, || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async { Err(PipelineError::provider("doomed.op", "hard down")) }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    match result {
        Err(PipelineError::Provider { message, .. }) => assert!(message.contains("hard down")),
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn retry_returns_immediately_on_first_success() {
    let attempts = AtomicUsize::new(0);
    let policy = RetryPolicy::default();

    let value = with_retry("steady.op", &policy, || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async { Ok("done") }
    })
    .await
    .unwrap();

    assert_eq!(value, "done");
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
