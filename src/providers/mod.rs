//! Metadata sources and the strategies built on them.
//!
//! This module contains the upstream YouTube client, the retry decorator,
//! the static fallback store, and the three strategies the orchestrator
//! chains together (live → fallback → placeholder).

pub mod fallback;
pub mod retry;
pub mod strategy;
pub mod traits;
pub mod youtube;

pub use fallback::{FallbackSnapshot, FallbackStore};
pub use retry::{RetryConfig, RetryingMetadataProvider};
pub use strategy::{FallbackStrategy, LiveStrategy, PlaceholderStrategy};
pub use traits::{MetadataProvider, MetadataStrategy};
pub use youtube::YouTubeClient;
