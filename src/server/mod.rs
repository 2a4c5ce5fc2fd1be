//! HTTP service mode.
//!
//! - `config`: TOML configuration and secrets loading
//! - `routes`: the axum router (`/metadata`, `/health`) with CORS and tracing
//! - `error`: mapping of pipeline errors onto HTTP responses

pub mod config;
pub mod error;
pub mod routes;

pub use config::{Config, Secrets};
pub use error::{ApiError, ErrorBody};
pub use routes::{AppState, RouterConfig, client_key, router};

use std::sync::Arc;
use std::time::Duration;

use crate::gateway::{Huginn, MetadataOrchestrator};
use crate::Result;

/// Build an orchestrator from loaded configuration and secrets.
pub fn build_orchestrator(config: &Config, secrets: &Secrets) -> Result<MetadataOrchestrator> {
    let mut builder = Huginn::builder()
        .youtube_base_url(config.upstream.base_url.clone())
        .upstream_timeout(Duration::from_secs(config.upstream.timeout_secs))
        .retry(config.retry_config())
        .rate_limit(config.rate_limit_config())
        .cache(config.cache_config());

    if let Some(key) = secrets.youtube_api_key() {
        builder = builder.youtube(key);
    }
    if let Some(path) = &config.fallback.path {
        builder = builder.fallback_path(path.clone());
    }

    builder.build()
}

/// Build the full HTTP application from configuration.
pub fn app(config: &Config, secrets: &Secrets) -> Result<axum::Router> {
    let orchestrator = build_orchestrator(config, secrets)?;
    Ok(router(
        Arc::new(orchestrator),
        &RouterConfig::from_config(config),
    ))
}
