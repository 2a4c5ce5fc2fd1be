//! Huginn - cached, rate-limited video metadata gateway
//!
//! Given a batch of YouTube video IDs, huginn returns title, view count and
//! publish date for each. Responses come from the live YouTube Data API when
//! possible, degrading to a static snapshot and finally to placeholders, so a
//! well-formed request always gets an answer. Successful live responses are
//! cached, and cache misses are rate limited per client.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::Huginn;
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let orchestrator = Huginn::builder()
//!         .youtube("your-api-key")
//!         .fallback_path("public/videos-metadata.json")
//!         .build()?;
//!
//!     let response = orchestrator
//!         .get_metadata(&["dQw4w9WgXcQ"], "203.0.113.7")
//!         .await?;
//!
//!     println!("{} video(s) from {}", response.videos.len(), response.source);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `server` (default): the axum HTTP surface and the `huginnd` daemon.

pub mod cache;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod ratelimit;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use cache::{CacheConfig, MetadataCache};
pub use error::{HuginnError, Result, UpstreamError};
pub use gateway::{Huginn, HuginnBuilder, MetadataOrchestrator};
pub use providers::{MetadataProvider, MetadataStrategy, RetryConfig};
pub use ratelimit::{RateLimitConfig, RateLimiter};
pub use version::{PKG_VERSION, version_string};

pub use types::{
    HealthReport, HealthStatus, MAX_BATCH_SIZE, MetadataResponse, Source, VideoId, VideoIdSet,
    VideoMetadata,
};
