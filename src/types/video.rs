//! Normalized video metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to synthesized entries when no real data is obtainable.
pub const PLACEHOLDER_TITLE: &str = "Metadata unavailable";

/// Metadata for a single video, as served to clients.
///
/// Field names on the wire (`views`, `date`) match what the site's
/// frontend and the fallback snapshot already use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "views", default)]
    pub view_count: u64,
    #[serde(rename = "date", default = "Utc::now")]
    pub published_at: DateTime<Utc>,
}

impl VideoMetadata {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        view_count: u64,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            view_count,
            published_at,
        }
    }

    /// Minimal stand-in used when neither live nor snapshot data exists.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self::new(id, PLACEHOLDER_TITLE, 0, Utc::now())
    }

    /// Whether this entry was synthesized by [`placeholder`](Self::placeholder).
    pub fn is_placeholder(&self) -> bool {
        self.title == PLACEHOLDER_TITLE && self.view_count == 0
    }
}
