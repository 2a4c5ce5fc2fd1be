//! Huginn error types

use std::time::Duration;

/// Failure talking to the upstream metadata provider.
///
/// Constructed at the point of failure so callers never have to infer the
/// failure mode from message text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream returned {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error("upstream request timed out")]
    Timeout,

    /// Network failure. The message never contains the request URL
    /// (it carries the API key).
    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error("upstream response could not be decoded: {0}")]
    Decode(String),

    #[error("upstream API key not configured")]
    NotConfigured,
}

impl UpstreamError {
    /// Whether a second attempt could plausibly succeed.
    ///
    /// Quota (403) and throttling (429) responses are not transient: retrying
    /// them only burns more quota.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Timeout | UpstreamError::Transport(_) => true,
            UpstreamError::Status { status, .. } => *status >= 500,
            UpstreamError::Decode(_) | UpstreamError::NotConfigured => false,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Status { .. } => "status",
            UpstreamError::Timeout => "timeout",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Decode(_) => "decode",
            UpstreamError::NotConfigured => "not_configured",
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.without_url().to_string())
        } else {
            UpstreamError::Transport(err.without_url().to_string())
        }
    }
}

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Client errors
    #[error("{0}")]
    Validation(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    // Degradable errors: the strategy chain moves on to the next source
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("fallback snapshot has no matching videos")]
    FallbackUnavailable,

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HuginnError {
    /// Whether this error is worth retrying against the same upstream.
    pub fn is_transient(&self) -> bool {
        match self {
            HuginnError::Upstream(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether the orchestrator should fall through to the next source.
    ///
    /// Validation and throttling are terminal: they are the caller's problem,
    /// not a sign that a source is unavailable.
    pub fn is_degradable(&self) -> bool {
        !matches!(
            self,
            HuginnError::Validation(_) | HuginnError::RateLimited { .. }
        )
    }

    /// Retry-after hint, if the error carries one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            HuginnError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;
