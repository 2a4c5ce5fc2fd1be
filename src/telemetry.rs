//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `source`: strategy that served a response ("live", "cached",
//!   "fallback", "placeholder")
//! - `status`: upstream outcome: "ok" or an error kind ("status",
//!   "timeout", "transport", "decode", "not_configured")

/// Total metadata responses served.
///
/// Labels: `source`.
pub const REQUESTS_TOTAL: &str = "huginn_requests_total";

/// Total upstream provider calls (one per attempt).
///
/// Labels: `status`.
pub const UPSTREAM_REQUESTS_TOTAL: &str = "huginn_upstream_requests_total";

/// Upstream call duration in seconds.
pub const UPSTREAM_DURATION_SECONDS: &str = "huginn_upstream_duration_seconds";

/// Total retry attempts (not counting the initial request).
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Total metadata cache hits.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total metadata cache misses (including expired entries).
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total requests rejected by the rate limiter.
pub const RATE_LIMITED_TOTAL: &str = "huginn_rate_limited_total";
