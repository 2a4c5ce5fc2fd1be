//! YouTube Data API v3 client for video metadata.
//!
//! Issues one `videos.list` call per batch (`part=snippet,statistics`),
//! which costs a single quota unit regardless of how many IDs (up to 50)
//! are requested.
//! See: <https://developers.google.com/youtube/v3/docs/videos/list>

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::traits::MetadataProvider;
use crate::telemetry;
use crate::types::{MAX_BATCH_SIZE, VideoIdSet, VideoMetadata};
use crate::{HuginnError, Result, UpstreamError};

/// Default base URL for the YouTube Data API.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Default per-request timeout. A hanging provider must not hold a request
/// open indefinitely.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Client for the YouTube Data API.
///
/// The API key is sent as a query parameter and never leaves the server:
/// error messages are stripped of the request URL before they are stored.
#[derive(Clone)]
pub struct YouTubeClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl YouTubeClient {
    /// Create a client with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL and request timeout.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| {
            HuginnError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch metadata for a batch of IDs in a single request.
    ///
    /// # Errors
    /// - `Validation` if the set is empty or exceeds [`MAX_BATCH_SIZE`]
    ///   (no request is made)
    /// - `Upstream` for non-2xx statuses, timeouts, transport failures and
    ///   undecodable bodies
    pub async fn fetch_batch(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        if ids.is_empty() {
            return Err(HuginnError::Validation(
                "at least one video ID is required".to_string(),
            ));
        }
        if ids.len() > MAX_BATCH_SIZE {
            return Err(HuginnError::Validation(format!(
                "Maximum {MAX_BATCH_SIZE} video IDs per request"
            )));
        }

        let start = Instant::now();
        let result = self.request(ids).await;
        let elapsed = start.elapsed();

        metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS).record(elapsed.as_secs_f64());
        let status = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL, "status" => status).increment(1);

        match result {
            Ok(videos) => {
                info!(
                    requested = ids.len(),
                    video_count = videos.len(),
                    duration_ms = elapsed.as_millis() as u64,
                    "youtube metadata fetched"
                );
                Ok(videos)
            }
            Err(e) => {
                warn!(
                    requested = ids.len(),
                    duration_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "youtube metadata request failed"
                );
                Err(e.into())
            }
        }
    }

    async fn request(&self, ids: &VideoIdSet) -> std::result::Result<Vec<VideoMetadata>, UpstreamError> {
        let url = format!("{}/youtube/v3/videos", self.base_url);
        let joined = ids.joined();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet,statistics"),
                ("id", joined.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.bytes().await?;
        let list: VideoListResponse =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode(e.to_string()))?;

        Ok(normalize_items(list.items.unwrap_or_default()))
    }
}

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Option<Vec<Value>>,
}

/// Convert raw API items into [`VideoMetadata`].
///
/// Items are parsed individually so one malformed entry cannot sink the
/// batch. Items without an `id` are dropped; repeated IDs keep the first.
fn normalize_items(items: Vec<Value>) -> Vec<VideoMetadata> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(normalize_item)
        .filter(|video| seen.insert(video.id.clone()))
        .collect()
}

fn normalize_item(item: &Value) -> Option<VideoMetadata> {
    let id = item.get("id")?.as_str()?.to_string();
    let snippet = &item["snippet"];
    let title = snippet["title"].as_str().unwrap_or_default().to_string();
    let view_count = coerce_view_count(&item["statistics"]["viewCount"]);
    let published_at = snippet["publishedAt"]
        .as_str()
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);

    Some(VideoMetadata {
        id,
        title,
        view_count,
        published_at,
    })
}

/// The API reports `viewCount` as a decimal string; accept numbers too.
/// Anything missing, negative or non-numeric becomes 0.
fn coerce_view_count(value: &Value) -> u64 {
    match value {
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_count))
                .unwrap_or(0)
        }
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(float_to_count))
            .unwrap_or(0),
        _ => 0,
    }
}

fn float_to_count(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0).then(|| f.trunc() as u64)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Provider Trait Implementation
// ============================================================================

#[async_trait]
impl MetadataProvider for YouTubeClient {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn fetch_batch(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        // Delegate to the inherent method
        YouTubeClient::fetch_batch(self, ids).await
    }
}
