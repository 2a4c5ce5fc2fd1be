//! Static fallback snapshot of video metadata.
//!
//! The snapshot is a JSON file produced out of band by a build step that
//! fetched live metadata earlier. Two shapes are accepted:
//!
//! ```text
//! { "videos": [...], "generatedAt": "2025-01-01T00:00:00Z", "count": 27 }
//! [ ... ]   // bare array of videos
//! ```
//!
//! # Loading
//!
//! The file is read at most once per process, on first use. A missing or
//! corrupt file is remembered as "unavailable" (logged once) and every
//! lookup then returns an empty list.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::{VideoIdSet, VideoMetadata};
use crate::{HuginnError, Result};

/// Snapshot file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackSnapshot {
    pub videos: Vec<VideoMetadata>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnapshot {
    Wrapped(FallbackSnapshot),
    Bare(Vec<VideoMetadata>),
}

/// Parse snapshot JSON, accepting both the wrapped and bare-array formats.
pub fn parse_snapshot(json: &str) -> Result<FallbackSnapshot> {
    let raw: RawSnapshot = serde_json::from_str(json).map_err(|e| {
        HuginnError::Configuration(format!("failed to parse fallback snapshot: {e}"))
    })?;
    Ok(match raw {
        RawSnapshot::Wrapped(snapshot) => snapshot,
        RawSnapshot::Bare(videos) => FallbackSnapshot {
            videos,
            generated_at: None,
        },
    })
}

enum SnapshotOrigin {
    File(PathBuf),
    Loaded(FallbackSnapshot),
    Absent,
}

/// Lazily loaded, read-only fallback snapshot.
pub struct FallbackStore {
    origin: SnapshotOrigin,
    snapshot: OnceLock<Option<FallbackSnapshot>>,
}

impl FallbackStore {
    /// Store backed by a snapshot file, read on first use.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: SnapshotOrigin::File(path.into()),
            snapshot: OnceLock::new(),
        }
    }

    /// Store backed by an in-memory snapshot.
    pub fn from_snapshot(snapshot: FallbackSnapshot) -> Self {
        Self {
            origin: SnapshotOrigin::Loaded(snapshot),
            snapshot: OnceLock::new(),
        }
    }

    /// Store with no snapshot; every lookup is empty.
    pub fn empty() -> Self {
        Self {
            origin: SnapshotOrigin::Absent,
            snapshot: OnceLock::new(),
        }
    }

    /// All snapshot videos. Idempotent: the file is read only once.
    pub fn load(&self) -> &[VideoMetadata] {
        self.snapshot()
            .map(|s| s.videos.as_slice())
            .unwrap_or_default()
    }

    /// Snapshot videos for the requested IDs, in requested order.
    ///
    /// IDs absent from the snapshot are skipped.
    pub fn get(&self, ids: &VideoIdSet) -> Vec<VideoMetadata> {
        let videos = self.load();
        ids.iter()
            .filter_map(|id| videos.iter().find(|v| v.id == id.as_str()))
            .cloned()
            .collect()
    }

    /// Whether a snapshot was loaded successfully.
    pub fn is_available(&self) -> bool {
        self.snapshot().is_some()
    }

    /// When the snapshot was generated, if recorded.
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().and_then(|s| s.generated_at)
    }

    fn snapshot(&self) -> Option<&FallbackSnapshot> {
        self.snapshot
            .get_or_init(|| match &self.origin {
                SnapshotOrigin::File(path) => read_snapshot(path),
                SnapshotOrigin::Loaded(snapshot) => Some(snapshot.clone()),
                SnapshotOrigin::Absent => None,
            })
            .as_ref()
    }
}

fn read_snapshot(path: &Path) -> Option<FallbackSnapshot> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "fallback snapshot unavailable");
            return None;
        }
    };
    match parse_snapshot(&content) {
        Ok(snapshot) => {
            info!(
                path = %path.display(),
                video_count = snapshot.videos.len(),
                generated_at = ?snapshot.generated_at,
                "fallback snapshot loaded"
            );
            Some(snapshot)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt fallback snapshot");
            None
        }
    }
}
