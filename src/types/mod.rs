//! Public types for the Huginn API.

mod health;
mod ids;
mod response;
mod video;

pub use health::{
    ApiCheck, CheckStatus, EnvironmentCheck, FallbackCheck, HealthChecks, HealthReport,
    HealthStatus,
};
pub use ids::{MAX_BATCH_SIZE, MISSING_IDS_MESSAGE, VideoId, VideoIdSet};
pub use response::{MetadataResponse, Source};
pub use video::{PLACEHOLDER_TITLE, VideoMetadata};
