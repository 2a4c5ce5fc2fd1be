//! TTL cache for live metadata responses.
//!
//! # Expiry
//!
//! Each entry records its own `expires_at`, computed from the TTL passed to
//! [`MetadataCache::put`]. Expiry is lazy: an expired entry is evicted when
//! it is next read. No background sweep runs.
//!
//! # Bounded size
//!
//! Entries live in a moka LRU cache capped at
//! [`CacheConfig::max_entries`], so an unbounded key space (many distinct ID
//! combinations) cannot grow memory without limit.
//!
//! # Clock
//!
//! Expiry uses `tokio::time::Instant`, which makes TTL behaviour testable
//! with a paused runtime clock.

use std::time::Duration;

use moka::sync::Cache;
use tokio::time::Instant;

use crate::telemetry;
use crate::types::MetadataResponse;

/// Default time-to-live, matching the upstream quota economics and the
/// `Cache-Control` max-age sent to clients.
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 3600);

/// Longest effective lifetime of an entry. Larger TTLs are clamped.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

/// Configuration for the metadata cache.
///
/// ```rust
/// # use huginn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(500)
///     .ttl(Duration::from_secs(600));
/// assert_eq!(config.ttl, Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 10,000.
    pub max_entries: u64,
    /// Time-to-live used by the orchestrator. Default: 6 hours.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    response: MetadataResponse,
    expires_at: Instant,
}

/// In-memory cache of live responses.
///
/// Thread-safe; moka serializes access per key internally.
pub struct MetadataCache {
    entries: Cache<String, CacheEntry>,
    ttl: Duration,
}

impl MetadataCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Cache::new(config.max_entries),
            ttl: config.ttl,
        }
    }

    /// Configured default time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a response by canonical key.
    ///
    /// Returns `None` on miss or expiry; expired entries are evicted.
    /// Emits cache hit/miss metrics.
    pub fn get(&self, key: &str) -> Option<MetadataResponse> {
        match self.entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(entry.response)
            }
            Some(_) => {
                self.entries.invalidate(key);
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store a response, expiring `ttl` from now (at most [`MAX_TTL`]).
    pub fn put(&self, key: impl Into<String>, response: MetadataResponse, ttl: Duration) {
        let now = Instant::now();
        let entry = CacheEntry {
            response,
            expires_at: now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now),
        };
        self.entries.insert(key.into(), entry);
    }

    /// Store a response with the configured default TTL.
    pub fn put_default(&self, key: impl Into<String>, response: MetadataResponse) {
        self.put(key, response, self.ttl);
    }

    /// Number of stored entries, expired ones included until next lookup.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VideoMetadata;

    fn response() -> MetadataResponse {
        MetadataResponse::live(vec![VideoMetadata::placeholder("dQw4w9WgXcQ")])
    }

    #[test]
    fn config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.max_entries, 10_000);
        assert_eq!(config.ttl, Duration::from_secs(21_600));
    }

    #[tokio::test(start_paused = true)]
    async fn miss_then_hit() {
        let cache = MetadataCache::default();
        assert!(cache.get("a").is_none());
        let stored = response();
        cache.put_default("a", stored.clone());
        assert_eq!(cache.get("a"), Some(stored));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = MetadataCache::default();
        cache.put("a", response(), Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get("a").is_some());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("a").is_none());
        // Evicted on read, so a second lookup still misses.
        assert!(cache.get("a").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn huge_ttl_is_clamped_instead_of_overflowing() {
        let cache = MetadataCache::new(&CacheConfig::new().ttl(Duration::from_secs(u64::MAX)));
        cache.put_default("a", response());
        assert!(cache.get("a").is_some());

        tokio::time::advance(MAX_TTL).await;
        assert!(cache.get("a").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn put_overwrites() {
        let cache = MetadataCache::default();
        cache.put_default("a", MetadataResponse::live(vec![]));
        cache.put_default("a", response());
        assert_eq!(cache.get("a").unwrap().videos.len(), 1);
    }
}
