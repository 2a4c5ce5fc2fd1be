//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use huginn::providers::MetadataProvider;
use huginn::types::{VideoIdSet, VideoMetadata};
use huginn::{Huginn, RateLimitConfig, Result, UpstreamError, telemetry};

// ============================================================================
// Mock providers
// ============================================================================

struct EchoProvider;

#[async_trait]
impl MetadataProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn fetch_batch(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        Ok(ids
            .iter()
            .map(|id| VideoMetadata::placeholder(id.as_str()))
            .collect())
    }
}

struct DownProvider;

#[async_trait]
impl MetadataProvider for DownProvider {
    fn name(&self) -> &str {
        "down"
    }

    async fn fetch_batch(&self, _ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        Err(UpstreamError::Status {
            status: 403,
            status_text: "Forbidden".into(),
        }
        .into())
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for a metric carrying a specific label value.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => *c,
            _ => 0,
        })
        .sum()
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn live_then_cached_records_source_and_cache_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let orchestrator = Huginn::builder()
                    .provider(Arc::new(EchoProvider))
                    .build()
                    .unwrap();
                orchestrator.get_metadata(&["dQw4w9WgXcQ"], "c").await.unwrap();
                orchestrator.get_metadata(&["dQw4w9WgXcQ"], "c").await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 2);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "source", "live"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "source", "cached"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn degraded_response_is_labelled_by_source() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let orchestrator = Huginn::builder()
                    .provider(Arc::new(DownProvider))
                    .build()
                    .unwrap();
                orchestrator.get_metadata(&["dQw4w9WgXcQ"], "c").await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "source", "placeholder"),
        1
    );
    // 403 is permanent: no retries recorded.
    assert_eq!(counter_total(&snapshot, telemetry::RETRIES_TOTAL), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn rejected_requests_record_rate_limit_metric() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let orchestrator = Huginn::builder()
                    .provider(Arc::new(EchoProvider))
                    .rate_limit(RateLimitConfig::new().max_requests(1))
                    .build()
                    .unwrap();
                orchestrator.get_metadata(&["aaaaaaaaaaa"], "c").await.unwrap();
                assert!(orchestrator.get_metadata(&["bbbbbbbbbbb"], "c").await.is_err());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::RATE_LIMITED_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let orchestrator = Huginn::builder()
        .provider(Arc::new(EchoProvider))
        .build()
        .unwrap();
    let _response = orchestrator
        .get_metadata(&["dQw4w9WgXcQ"], "c")
        .await
        .unwrap();
}
