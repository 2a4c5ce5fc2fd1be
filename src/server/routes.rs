//! Router setup and request handlers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tower::ServiceBuilder;
use tower::limit::ConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use super::config::Config;
use super::error::{ApiError, ApiResult};
use crate::gateway::MetadataOrchestrator;
use crate::HuginnError;
use crate::types::{HealthStatus, MISSING_IDS_MESSAGE, Source, VideoIdSet};

/// Cache policy for live and cached responses (6 hours at browser and CDN).
pub const CACHE_CONTROL_FRESH: &str = "public, max-age=21600, s-maxage=21600";
/// Cache policy for degraded responses and health reports.
pub const CACHE_CONTROL_NO_CACHE: &str = "no-cache";

const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Client key used when neither headers nor the socket identify the caller.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Shared handler state.
pub type AppState = Arc<MetadataOrchestrator>;

/// HTTP surface settings.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    pub allowed_origins: Vec<String>,
    pub request_timeout: Option<Duration>,
    pub concurrency_limit: Option<usize>,
}

impl RouterConfig {
    pub fn from_config(config: &Config) -> Self {
        let limits = &config.server.limits;
        Self {
            allowed_origins: config.server.allowed_origins.clone(),
            request_timeout: (limits.request_timeout_secs > 0)
                .then(|| Duration::from_secs(limits.request_timeout_secs)),
            concurrency_limit: (limits.max_concurrent_requests > 0)
                .then_some(limits.max_concurrent_requests),
        }
    }
}

/// Creates the HTTP router.
pub fn router(state: AppState, config: &RouterConfig) -> Router {
    let router = Router::new()
        .route(
            "/metadata",
            get(get_metadata)
                .head(method_not_allowed)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/health",
            get(health)
                .head(method_not_allowed)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http());

    let router = match config.concurrency_limit {
        Some(limit) => router.layer(ConcurrencyLimitLayer::new(limit)),
        None => router,
    };

    let router = match config.request_timeout {
        Some(timeout) => router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(timeout)),
        ),
        None => router,
    };

    router.with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}

#[derive(Debug, Deserialize)]
struct MetadataQuery {
    ids: Option<String>,
}

async fn get_metadata(
    State(orchestrator): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    query: Result<Query<MetadataQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query.map_err(|rejection| {
        debug!(error = %rejection, "unparsable metadata query");
        HuginnError::Validation(MISSING_IDS_MESSAGE.to_string())
    })?;
    let ids = VideoIdSet::parse_query(query.ids.as_deref().unwrap_or_default())?;
    let client = client_key(&headers, peer.map(|ConnectInfo(addr)| addr));

    let response = orchestrator.get_metadata_for(&ids, &client).await?;
    Ok((
        StatusCode::OK,
        [(header::CACHE_CONTROL, cache_policy(response.source))],
        axum::Json(response),
    )
        .into_response())
}

async fn health(State(orchestrator): State<AppState>) -> Response {
    let report = orchestrator.health().await;
    let status = match report.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Unhealthy => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        [(header::CACHE_CONTROL, CACHE_CONTROL_NO_CACHE)],
        axum::Json(report),
    )
        .into_response()
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn handle_timeout_error(_err: tower::BoxError) -> ApiError {
    ApiError::Timeout
}

/// Identify the caller for rate limiting.
///
/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}

/// Degraded responses must not be cached downstream.
fn cache_policy(source: Source) -> &'static str {
    if source.is_fresh() {
        CACHE_CONTROL_FRESH
    } else {
        CACHE_CONTROL_NO_CACHE
    }
}
