//! The three built-in degradation strategies.
//!
//! ```text
//!   LiveStrategy ──(upstream error / not configured)──► FallbackStrategy
//!        │                                                  │
//!        ▼ ok                                  (no matching │ videos)
//!   source=live                                             ▼
//!                                              PlaceholderStrategy (never fails)
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use super::fallback::FallbackStore;
use super::traits::{MetadataProvider, MetadataStrategy};
use crate::types::{Source, VideoIdSet, VideoMetadata};
use crate::{HuginnError, Result, UpstreamError};

/// Fetches from the live upstream provider.
///
/// Without a provider (no API key configured) every call fails with
/// [`UpstreamError::NotConfigured`], sending the request straight to the
/// fallback.
pub struct LiveStrategy {
    provider: Option<Arc<dyn MetadataProvider>>,
}

impl LiveStrategy {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Live strategy for a process with no upstream credential.
    pub fn unconfigured() -> Self {
        Self { provider: None }
    }
}

#[async_trait]
impl MetadataStrategy for LiveStrategy {
    fn source(&self) -> Source {
        Source::Live
    }

    async fn resolve(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        match &self.provider {
            Some(provider) => provider.fetch_batch(ids).await,
            None => Err(UpstreamError::NotConfigured.into()),
        }
    }
}

/// Serves requested IDs from the static snapshot.
pub struct FallbackStrategy {
    store: Arc<FallbackStore>,
}

impl FallbackStrategy {
    pub fn new(store: Arc<FallbackStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MetadataStrategy for FallbackStrategy {
    fn source(&self) -> Source {
        Source::Fallback
    }

    async fn resolve(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        let videos = self.store.get(ids);
        if videos.is_empty() {
            return Err(HuginnError::FallbackUnavailable);
        }
        Ok(videos)
    }
}

/// Synthesizes one placeholder per requested ID. Always succeeds.
pub struct PlaceholderStrategy;

#[async_trait]
impl MetadataStrategy for PlaceholderStrategy {
    fn source(&self) -> Source {
        Source::Placeholder
    }

    async fn resolve(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        Ok(ids
            .iter()
            .map(|id| VideoMetadata::placeholder(id.as_str()))
            .collect())
    }
}
