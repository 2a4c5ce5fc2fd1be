//! Validated video identifiers and canonical ID sets.

use std::collections::HashSet;
use std::fmt;

use crate::{HuginnError, Result};

/// Provider limit on the number of IDs in one batch request.
pub const MAX_BATCH_SIZE: usize = 50;

/// Validation message for a request without any usable ID.
pub const MISSING_IDS_MESSAGE: &str = "Missing required parameter: ids (comma-separated video IDs)";

/// Length of a provider video ID.
const VIDEO_ID_LEN: usize = 11;

/// A syntactically valid provider video ID: 11 characters of `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    /// Validate a raw identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        let valid = raw.len() == VIDEO_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(HuginnError::Validation(format!(
                "Invalid video ID format: {raw}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated, deduplicated set of requested IDs.
///
/// Keeps request order (first occurrence wins) for presenting results, and
/// derives an order-independent [`cache_key`](Self::cache_key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoIdSet {
    ids: Vec<VideoId>,
    key: String,
}

impl VideoIdSet {
    /// Parse a comma-separated `ids` query value.
    ///
    /// Empty segments (`"a,,b"`, trailing commas) are ignored.
    pub fn parse_query(raw: &str) -> Result<Self> {
        Self::parse(raw.split(','))
    }

    /// Validate and canonicalize a list of raw IDs.
    ///
    /// The batch limit counts IDs as requested, before deduplication, so a
    /// request can never smuggle more than [`MAX_BATCH_SIZE`] entries through.
    pub fn parse<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw: Vec<String> = raw
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if raw.is_empty() {
            return Err(HuginnError::Validation(
                MISSING_IDS_MESSAGE.to_string(),
            ));
        }
        if raw.len() > MAX_BATCH_SIZE {
            return Err(HuginnError::Validation(format!(
                "Maximum {MAX_BATCH_SIZE} video IDs per request"
            )));
        }

        let mut seen = HashSet::with_capacity(raw.len());
        let mut ids = Vec::with_capacity(raw.len());
        for s in &raw {
            let id = VideoId::parse(s)?;
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }

        let mut sorted: Vec<&str> = ids.iter().map(VideoId::as_str).collect();
        sorted.sort_unstable();
        let key = sorted.join(",");

        Ok(Self { ids, key })
    }

    /// IDs in request order, without duplicates.
    pub fn ids(&self) -> &[VideoId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoId> {
        self.ids.iter()
    }

    /// Canonical form: sorted, deduplicated, comma-joined.
    pub fn cache_key(&self) -> &str {
        &self.key
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|v| v.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Comma-joined IDs in request order, as sent upstream.
    pub fn joined(&self) -> String {
        self.ids
            .iter()
            .map(VideoId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}
