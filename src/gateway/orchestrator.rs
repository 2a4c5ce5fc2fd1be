//! The metadata pipeline: cache → rate limit → ordered strategy chain.
//!
//! # Request Flow
//!
//! ```text
//! get_metadata(ids, client)
//!        │
//!        ▼
//!  VideoIdSet::parse ──invalid──► Err(Validation)
//!        │
//!        ▼
//!  MetadataCache::get ──hit──► source=cached   (no rate-limit cost)
//!        │ miss
//!        ▼
//!  RateLimiter::admit ──reject──► Err(RateLimited)
//!        │
//!        ▼
//!  strategies, in order: live → fallback → placeholder
//!        first success wins; live successes populate the cache
//! ```
//!
//! No retries happen here. Retrying belongs to the upstream provider
//! (see [`RetryingMetadataProvider`](crate::providers::RetryingMetadataProvider)).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{CacheConfig, MetadataCache};
use crate::providers::{FallbackStore, MetadataProvider, MetadataStrategy};
use crate::ratelimit::{RateLimitConfig, RateLimiter};
use crate::telemetry;
use crate::types::{
    ApiCheck, CheckStatus, EnvironmentCheck, FallbackCheck, HealthChecks, HealthReport,
    MetadataResponse, Source, VideoIdSet, VideoMetadata,
};
use crate::{HuginnError, Result, UpstreamError};

/// A long-lived public video used to probe upstream connectivity.
pub const HEALTH_PROBE_ID: &str = "dQw4w9WgXcQ";

/// How long an upstream probe result is reused by [`MetadataOrchestrator::health`].
pub const HEALTH_PROBE_TTL: Duration = Duration::from_secs(30);

/// Composes cache, rate limiter and strategy chain.
///
/// Owns the cache and limiter exclusively; the fallback snapshot is shared
/// read-only with the fallback strategy.
pub struct MetadataOrchestrator {
    cache: MetadataCache,
    limiter: RateLimiter,
    strategies: Vec<Arc<dyn MetadataStrategy>>,
    provider: Option<Arc<dyn MetadataProvider>>,
    fallback: Arc<FallbackStore>,
    last_probe: Mutex<Option<(Instant, ApiCheck)>>,
}

impl MetadataOrchestrator {
    /// Assemble an orchestrator from an explicit strategy chain.
    ///
    /// `provider` and `fallback` are only consulted by [`health`](Self::health);
    /// request handling goes exclusively through `strategies`.
    pub fn new(
        strategies: Vec<Arc<dyn MetadataStrategy>>,
        provider: Option<Arc<dyn MetadataProvider>>,
        fallback: Arc<FallbackStore>,
        cache: &CacheConfig,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            cache: MetadataCache::new(cache),
            limiter: RateLimiter::new(rate_limit),
            strategies,
            provider,
            fallback,
            last_probe: Mutex::new(None),
        }
    }

    /// Validate raw IDs and serve metadata for them.
    pub async fn get_metadata<S: AsRef<str> + Sync>(
        &self,
        ids: &[S],
        client_key: &str,
    ) -> Result<MetadataResponse> {
        let ids = VideoIdSet::parse(ids)?;
        self.get_metadata_for(&ids, client_key).await
    }

    /// Serve metadata for an already validated ID set.
    #[instrument(skip(self, ids), fields(video_count = ids.len()))]
    pub async fn get_metadata_for(
        &self,
        ids: &VideoIdSet,
        client_key: &str,
    ) -> Result<MetadataResponse> {
        let key = ids.cache_key();

        if let Some(cached) = self.cache.get(key) {
            debug!(key, "metadata cache hit");
            Self::record_response(Source::Cached);
            return Ok(cached.into_cached());
        }

        if !self.limiter.admit(client_key) {
            metrics::counter!(telemetry::RATE_LIMITED_TOTAL).increment(1);
            info!(client = client_key, "rate limit exceeded");
            return Err(HuginnError::RateLimited {
                retry_after: self.limiter.retry_after(client_key),
            });
        }

        let response = self.run_chain(ids).await?;
        if response.source == Source::Live {
            self.cache.put_default(key, response.clone());
        }
        Self::record_response(response.source);
        Ok(response)
    }

    /// Evaluate strategies in order until one produces videos.
    async fn run_chain(&self, ids: &VideoIdSet) -> Result<MetadataResponse> {
        let mut failures: Vec<(Source, HuginnError)> = Vec::new();

        for strategy in &self.strategies {
            let source = strategy.source();
            match strategy.resolve(ids).await {
                Ok(videos) => return Ok(Self::assemble(source, videos, &failures)),
                Err(e) if !e.is_degradable() => return Err(e),
                Err(e) => {
                    if matches!(e, HuginnError::Upstream(UpstreamError::NotConfigured)) {
                        debug!(%source, "live source not configured");
                    } else {
                        warn!(%source, error = %e, "metadata source failed, degrading");
                    }
                    failures.push((source, e));
                }
            }
        }

        error!(
            failures = %describe_failures(&failures),
            "every metadata source failed"
        );
        Err(HuginnError::Internal(
            "no metadata source produced a response".to_string(),
        ))
    }

    fn assemble(
        source: Source,
        videos: Vec<VideoMetadata>,
        failures: &[(Source, HuginnError)],
    ) -> MetadataResponse {
        match source {
            Source::Live | Source::Cached => MetadataResponse::live(videos),
            Source::Fallback => {
                let reason = match failures.first() {
                    Some((_, e)) => e.to_string(),
                    None => "live metadata unavailable".to_string(),
                };
                MetadataResponse::degraded(videos, source, reason)
            }
            Source::Placeholder => MetadataResponse::degraded(
                videos,
                source,
                format!(
                    "no metadata source available ({})",
                    describe_failures(failures)
                ),
            ),
        }
    }

    fn record_response(source: Source) {
        metrics::counter!(telemetry::REQUESTS_TOTAL, "source" => source.as_str()).increment(1);
    }

    /// Check configuration, upstream connectivity and snapshot availability.
    ///
    /// The upstream probe bypasses the cache and the rate limiter, so its
    /// result is reused for [`HEALTH_PROBE_TTL`] to bound quota spent on polling.
    pub async fn health(&self) -> HealthReport {
        let environment = if self.provider.is_some() {
            EnvironmentCheck {
                status: CheckStatus::Ok,
                message: None,
            }
        } else {
            EnvironmentCheck {
                status: CheckStatus::Failed,
                message: Some("YouTube API key not configured".to_string()),
            }
        };

        let api = match &self.provider {
            Some(provider) => self.cached_probe(provider.as_ref()).await,
            None => ApiCheck {
                status: CheckStatus::Failed,
                response_time_ms: None,
            },
        };

        let fallback = FallbackCheck {
            status: if self.fallback.is_available() {
                CheckStatus::Ok
            } else {
                CheckStatus::Failed
            },
        };

        let report = HealthReport::from_checks(HealthChecks {
            api,
            fallback,
            environment,
        });
        info!(status = ?report.status, "health check completed");
        report
    }

    async fn cached_probe(&self, provider: &dyn MetadataProvider) -> ApiCheck {
        if let Some(check) = self.recent_probe() {
            debug!("health check: reusing recent upstream probe");
            return check;
        }
        let check = self.probe(provider).await;
        let mut last = match self.last_probe.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last = Some((Instant::now(), check.clone()));
        check
    }

    fn recent_probe(&self) -> Option<ApiCheck> {
        let last = match self.last_probe.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        last.as_ref()
            .filter(|(at, _)| at.elapsed() < HEALTH_PROBE_TTL)
            .map(|(_, check)| check.clone())
    }

    async fn probe(&self, provider: &dyn MetadataProvider) -> ApiCheck {
        let ids = match VideoIdSet::parse([HEALTH_PROBE_ID]) {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "health probe ID rejected");
                return ApiCheck {
                    status: CheckStatus::Failed,
                    response_time_ms: None,
                };
            }
        };
        let start = Instant::now();
        match provider.fetch_batch(&ids).await {
            Ok(_) => ApiCheck {
                status: CheckStatus::Ok,
                response_time_ms: Some(start.elapsed().as_millis() as u64),
            },
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "health check: upstream failed");
                ApiCheck {
                    status: CheckStatus::Failed,
                    response_time_ms: None,
                }
            }
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn fallback(&self) -> &FallbackStore {
        &self.fallback
    }

    /// Whether a live upstream provider is configured.
    pub fn has_live_provider(&self) -> bool {
        self.provider.is_some()
    }
}

fn describe_failures(failures: &[(Source, HuginnError)]) -> String {
    failures
        .iter()
        .map(|(source, e)| format!("{source}: {e}"))
        .collect::<Vec<_>>()
        .join("; ")
}
