//! Retry configuration, delay calculation, and the provider decorator.
//!
//! Provides [`RetryConfig`] for controlling retry behaviour and
//! [`RetryingMetadataProvider`], which wraps any [`MetadataProvider`] with
//! automatic retry on transient errors.
//!
//! Every upstream attempt costs quota, so the number of attempts is capped at
//! [`MAX_ATTEMPTS_CAP`] no matter what the configuration asks for.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::traits::MetadataProvider;
use crate::telemetry;
use crate::types::{VideoIdSet, VideoMetadata};
use crate::{HuginnError, Result};

/// Hard ceiling on attempts per upstream call (initial request + 1 retry).
pub const MAX_ATTEMPTS_CAP: u32 = 2;

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff. Attempts above [`MAX_ATTEMPTS_CAP`] are
/// ignored:
///
/// ```rust
/// # use huginn::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(100));
/// assert_eq!(config.effective_attempts(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 2.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 250ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 2s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Attempts actually made: at least 1, at most [`MAX_ATTEMPTS_CAP`].
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS_CAP)
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    ///
    /// Uses exponential backoff: `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }
}

/// Execute an async operation with retry logic.
///
/// Retries on transient errors (as classified by
/// [`HuginnError::is_transient()`]) up to
/// [`effective_attempts`](RetryConfig::effective_attempts). Permanent errors
/// are returned immediately without retry.
pub(crate) async fn with_retry<F, Fut, T>(config: &RetryConfig, provider_name: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.effective_attempts();
    let mut last_err = None;
    for attempt in 0..max_attempts {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if attempt + 1 < max_attempts {
                    metrics::counter!(telemetry::RETRIES_TOTAL).increment(1);
                    let delay = config.delay_for_attempt(attempt);
                    warn!(
                        provider = provider_name,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e), // permanent error, no retry
        }
    }
    Err(last_err.unwrap_or_else(|| HuginnError::Internal("retry loop made no attempts".into())))
}

/// Decorator that wraps a [`MetadataProvider`] with retry logic.
///
/// On transient errors (timeouts, transport failures, 5xx) retries with
/// exponential backoff. Quota and client errors are returned immediately.
pub struct RetryingMetadataProvider {
    inner: Arc<dyn MetadataProvider>,
    config: RetryConfig,
}

impl RetryingMetadataProvider {
    /// Wrap a metadata provider with retry logic.
    pub fn new(inner: Arc<dyn MetadataProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl MetadataProvider for RetryingMetadataProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_batch(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        with_retry(&self.config, self.inner.name(), || self.inner.fetch_batch(ids)).await
    }
}
