//! Orchestrator and its builder

mod builder;
mod orchestrator;

pub use builder::{Huginn, HuginnBuilder};
pub use orchestrator::{HEALTH_PROBE_ID, HEALTH_PROBE_TTL, MetadataOrchestrator};
