//! Builder for configuring orchestrator instances

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use super::MetadataOrchestrator;
use crate::Result;
use crate::cache::CacheConfig;
use crate::providers::youtube::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::providers::{
    FallbackSnapshot, FallbackStore, FallbackStrategy, LiveStrategy, MetadataProvider,
    MetadataStrategy, PlaceholderStrategy, RetryConfig, RetryingMetadataProvider, YouTubeClient,
};
use crate::ratelimit::RateLimitConfig;

/// Main entry point for creating orchestrator instances.
pub struct Huginn;

impl Huginn {
    /// Create a new builder for configuring the orchestrator.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }
}

enum FallbackSource {
    None,
    Path(PathBuf),
    Snapshot(FallbackSnapshot),
}

/// Builder for configuring orchestrator instances.
///
/// ```rust,no_run
/// # use huginn::Huginn;
/// # fn main() -> huginn::Result<()> {
/// let orchestrator = Huginn::builder()
///     .youtube("your-api-key")
///     .fallback_path("public/videos-metadata.json")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HuginnBuilder {
    youtube_key: Option<String>,
    youtube_base_url: Option<String>,
    upstream_timeout: Duration,
    provider: Option<Arc<dyn MetadataProvider>>,
    retry_config: RetryConfig,
    fallback: FallbackSource,
    rate_limit: RateLimitConfig,
    cache: CacheConfig,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            youtube_key: None,
            youtube_base_url: None,
            upstream_timeout: DEFAULT_TIMEOUT,
            provider: None,
            retry_config: RetryConfig::default(),
            fallback: FallbackSource::None,
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Configure the YouTube Data API provider. A blank key counts as absent.
    pub fn youtube(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.youtube_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    /// Override the YouTube API base URL (for testing with wiremock).
    pub fn youtube_base_url(mut self, url: impl Into<String>) -> Self {
        self.youtube_base_url = Some(url.into());
        self
    }

    /// Per-request timeout for upstream calls. Default: 8s.
    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Use a custom live provider instead of the YouTube client.
    pub fn provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the retry configuration for the live provider.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Disable upstream retries entirely.
    pub fn disable_retry(mut self) -> Self {
        self.retry_config = RetryConfig::disabled();
        self
    }

    /// Read the fallback snapshot from a file (lazily, once).
    pub fn fallback_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback = FallbackSource::Path(path.into());
        self
    }

    /// Use an in-memory fallback snapshot.
    pub fn fallback_snapshot(mut self, snapshot: FallbackSnapshot) -> Self {
        self.fallback = FallbackSource::Snapshot(snapshot);
        self
    }

    /// Set the rate limiter configuration.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Set the cache configuration.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Build the orchestrator.
    ///
    /// A missing API key is not an error: the process runs in fallback-only
    /// mode, which is logged once here.
    pub fn build(self) -> Result<MetadataOrchestrator> {
        let provider: Option<Arc<dyn MetadataProvider>> = match (self.provider, self.youtube_key) {
            (Some(custom), _) => Some(custom),
            (None, Some(key)) => {
                let base_url = self
                    .youtube_base_url
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
                let client: Arc<dyn MetadataProvider> = Arc::new(YouTubeClient::with_options(
                    key,
                    base_url,
                    self.upstream_timeout,
                )?);
                Some(client)
            }
            (None, None) => {
                error!(
                    "YouTube API key not configured; every request will be served \
                     from the fallback snapshot or placeholders"
                );
                None
            }
        };

        let provider = provider.map(|p| -> Arc<dyn MetadataProvider> {
            if self.retry_config.effective_attempts() > 1 {
                Arc::new(RetryingMetadataProvider::new(p, self.retry_config.clone()))
            } else {
                p
            }
        });

        let fallback = Arc::new(match self.fallback {
            FallbackSource::None => FallbackStore::empty(),
            FallbackSource::Path(path) => FallbackStore::from_path(path),
            FallbackSource::Snapshot(snapshot) => FallbackStore::from_snapshot(snapshot),
        });

        let live = match &provider {
            Some(p) => LiveStrategy::new(Arc::clone(p)),
            None => LiveStrategy::unconfigured(),
        };
        let strategies: Vec<Arc<dyn MetadataStrategy>> = vec![
            Arc::new(live),
            Arc::new(FallbackStrategy::new(Arc::clone(&fallback))),
            Arc::new(PlaceholderStrategy),
        ];

        info!(
            live = provider.is_some(),
            window_secs = self.rate_limit.window.as_secs(),
            max_requests = self.rate_limit.max_requests,
            cache_ttl_secs = self.cache.ttl.as_secs(),
            "metadata orchestrator built"
        );

        Ok(MetadataOrchestrator::new(
            strategies,
            provider,
            fallback,
            &self.cache,
            self.rate_limit,
        ))
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
