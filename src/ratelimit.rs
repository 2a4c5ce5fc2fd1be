//! Sliding-window rate limiting per client.
//!
//! [`RateLimiter`] keeps, for each client key, the instants of its admitted
//! requests within the trailing window. A request is admitted while fewer
//! than `max_requests` timestamps remain after pruning.
//!
//! # Limitations
//!
//! State is in-memory and per process. Horizontally scaled deployments get
//! independent limits per instance; nothing is coordinated across
//! processes, and everything resets on restart.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Tracked-key count above which idle entries are swept.
const SWEEP_THRESHOLD: usize = 1_000;

/// Configuration for the rate limiter.
///
/// ```rust
/// # use huginn::RateLimitConfig;
/// # use std::time::Duration;
/// let config = RateLimitConfig::new()
///     .window(Duration::from_secs(10))
///     .max_requests(5);
/// assert_eq!(config.max_requests, 5);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Length of the trailing window. Default: 60s.
    pub window: Duration,
    /// Admitted requests allowed per window. Default: 60.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 60,
        }
    }
}

impl RateLimitConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window length.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the per-window request limit.
    pub fn max_requests(mut self, n: u32) -> Self {
        self.max_requests = n;
        self
    }

    /// A zero window or zero limit cannot admit anything meaningfully.
    fn is_usable(&self) -> bool {
        !self.window.is_zero() && self.max_requests > 0
    }
}

/// Per-client sliding-window rate limiter.
///
/// All bookkeeping for a request (prune, count, append) happens under one
/// lock, so concurrent requests from the same client cannot both slip in
/// past the limit.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or reject one request from `client_key`.
    ///
    /// Rejected requests are not recorded. Never panics: a misconfigured
    /// limiter rejects everything.
    pub fn admit(&self, client_key: &str) -> bool {
        if !self.config.is_usable() {
            return false;
        }

        let now = Instant::now();
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let timestamps = windows.entry(client_key.to_string()).or_default();
        prune(timestamps, now, self.config.window);

        if timestamps.len() >= self.config.max_requests as usize {
            return false;
        }
        timestamps.push_back(now);

        if windows.len() > SWEEP_THRESHOLD {
            sweep(&mut windows, now, self.config.window);
        }
        true
    }

    /// Time until `client_key` would be admitted again, if currently limited.
    pub fn retry_after(&self, client_key: &str) -> Option<Duration> {
        if !self.config.is_usable() {
            return None;
        }
        let now = Instant::now();
        let windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let timestamps = windows.get(client_key)?;
        let live: Vec<&Instant> = timestamps
            .iter()
            .filter(|t| now.duration_since(**t) < self.config.window)
            .collect();
        if live.len() < self.config.max_requests as usize {
            return None;
        }
        let oldest = live.first()?;
        Some(self.config.window.saturating_sub(now.duration_since(**oldest)))
    }

    /// Number of client keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        match self.windows.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Drop every client whose window is empty.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sweep(&mut windows, now, self.config.window);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Remove timestamps that have left the window. Timestamps are appended in
/// order, so expired ones are always at the front.
fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = timestamps.front() {
        if now.duration_since(*oldest) >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

fn sweep(windows: &mut HashMap<String, VecDeque<Instant>>, now: Instant, window: Duration) {
    let before = windows.len();
    windows.retain(|_, timestamps| {
        prune(timestamps, now, window);
        !timestamps.is_empty()
    });
    debug!(before, after = windows.len(), "swept idle rate-limit windows");
}
