//! Assembled metadata responses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::video::VideoMetadata;

/// Which strategy produced a response.
///
/// Anything other than [`Source::Live`] or [`Source::Cached`] tells the
/// frontend to show a "data may be stale" notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Cached,
    Fallback,
    Placeholder,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Live => "live",
            Source::Cached => "cached",
            Source::Fallback => "fallback",
            Source::Placeholder => "placeholder",
        }
    }

    /// Served from real provider data, fresh or cached.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Source::Live | Source::Cached)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a batch of videos plus the provenance of the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub videos: Vec<VideoMetadata>,
    pub source: Source,
    /// When the underlying data was assembled. Cached responses keep the
    /// time of the original live fetch.
    pub timestamp: DateTime<Utc>,
    /// Why the response is degraded. Absent for live and cached responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetadataResponse {
    pub fn live(videos: Vec<VideoMetadata>) -> Self {
        Self {
            videos,
            source: Source::Live,
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn degraded(videos: Vec<VideoMetadata>, source: Source, reason: impl Into<String>) -> Self {
        Self {
            videos,
            source,
            timestamp: Utc::now(),
            error: Some(reason.into()),
        }
    }

    /// Re-tag a stored live response as served from cache.
    pub fn into_cached(mut self) -> Self {
        self.source = Source::Cached;
        self.error = None;
        self
    }
}
