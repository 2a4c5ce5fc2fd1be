//! Traits at the two seams of the pipeline.
//!
//! - [`MetadataProvider`]: a live source of video metadata (the upstream
//!   API client, or a decorator around one such as the retrying wrapper).
//! - [`MetadataStrategy`]: one step of the orchestrator's degradation
//!   chain. Each strategy tags its output with a [`Source`] and either
//!   produces videos or reports why it could not.
//!
//! # Chain Semantics
//!
//! Strategies are evaluated in order. A strategy signals "try the next one"
//! by returning any degradable error (see
//! [`HuginnError::is_degradable()`](crate::HuginnError::is_degradable));
//! validation errors stop the chain.
//!
//! # Example
//!
//! ```ignore
//! async fn resolve(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
//!     let videos = self.store.get(ids);
//!     if videos.is_empty() {
//!         return Err(HuginnError::FallbackUnavailable);
//!     }
//!     Ok(videos)
//! }
//! ```

use async_trait::async_trait;

use crate::Result;
use crate::types::{Source, VideoIdSet, VideoMetadata};

// ============================================================================
// Metadata Provider
// ============================================================================

/// Live source of video metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Fetch metadata for every ID in one batched call.
    ///
    /// Videos the provider does not know about are omitted, not synthesized.
    async fn fetch_batch(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>>;
}

// ============================================================================
// Metadata Strategy
// ============================================================================

/// One step in the orchestrator's ordered degradation chain.
#[async_trait]
pub trait MetadataStrategy: Send + Sync {
    /// Source tag attached to responses this strategy produces.
    fn source(&self) -> Source;

    /// Produce videos for `ids`, or a tagged error explaining why not.
    async fn resolve(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>>;
}
