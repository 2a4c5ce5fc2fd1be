//! HTTP surface tests driven through `tower::ServiceExt::oneshot`.

#![cfg(feature = "server")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use tower::ServiceExt;

use huginn::providers::{FallbackSnapshot, MetadataProvider};
use huginn::server::{RouterConfig, router};
use huginn::types::{VideoIdSet, VideoMetadata};
use huginn::{Huginn, HuginnBuilder, Result, UpstreamError};

struct EchoProvider;

#[async_trait]
impl MetadataProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn fetch_batch(&self, ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        Ok(ids
            .iter()
            .map(|id| VideoMetadata::new(id.as_str(), "Live", 1, chrono::Utc::now()))
            .collect())
    }
}

struct DownProvider;

#[async_trait]
impl MetadataProvider for DownProvider {
    fn name(&self) -> &str {
        "down"
    }

    async fn fetch_batch(&self, _ids: &VideoIdSet) -> Result<Vec<VideoMetadata>> {
        Err(UpstreamError::Timeout.into())
    }
}

fn app_from(builder: HuginnBuilder) -> Router {
    let config = RouterConfig {
        allowed_origins: vec![
            "http://localhost:3000".to_string(),
            "https://pastelsketchbook.org".to_string(),
        ],
        request_timeout: None,
        concurrency_limit: None,
    };
    router(Arc::new(builder.build().unwrap()), &config)
}

fn live_app() -> Router {
    app_from(Huginn::builder().provider(Arc::new(EchoProvider)))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// /metadata
// ============================================================================

#[tokio::test]
async fn live_response_is_publicly_cacheable() {
    let response = live_app()
        .oneshot(get("/metadata?ids=dQw4w9WgXcQ,,9bZkp7q19f0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=21600, s-maxage=21600"
    );
    let body = json_body(response).await;
    assert_eq!(body["source"], "live");
    assert_eq!(body["videos"].as_array().unwrap().len(), 2);
    assert_eq!(body["videos"][0]["id"], "dQw4w9WgXcQ");
    assert_eq!(body["videos"][0]["views"], 1);
    assert!(body["videos"][0]["date"].is_string());
    assert!(body["timestamp"].is_string());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn degraded_response_is_not_cacheable() {
    let app = app_from(
        Huginn::builder()
            .provider(Arc::new(DownProvider))
            .disable_retry(),
    );
    let response = app.oneshot(get("/metadata?ids=dQw4w9WgXcQ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    let body = json_body(response).await;
    assert_eq!(body["source"], "placeholder");
    assert_eq!(body["videos"][0]["title"], "Metadata unavailable");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn fallback_response_over_http() {
    let app = app_from(
        Huginn::builder()
            .provider(Arc::new(DownProvider))
            .disable_retry()
            .fallback_snapshot(FallbackSnapshot {
                videos: vec![VideoMetadata::new(
                    "dQw4w9WgXcQ",
                    "From snapshot",
                    99,
                    chrono::Utc::now(),
                )],
                generated_at: None,
            }),
    );
    let response = app.oneshot(get("/metadata?ids=dQw4w9WgXcQ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["videos"][0]["title"], "From snapshot");
    assert_eq!(body["error"], "upstream request timed out");
}

#[tokio::test]
async fn missing_ids_is_bad_request() {
    for uri in ["/metadata", "/metadata?ids=", "/metadata?ids=,,"] {
        let response = live_app().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            json_body(response).await["error"],
            "Missing required parameter: ids (comma-separated video IDs)"
        );
    }
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let response = live_app()
        .oneshot(get("/metadata?ids=dQw4w9WgXcQ,nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Invalid video ID format: nope"
    );
}

#[tokio::test]
async fn more_than_fifty_ids_is_bad_request() {
    let ids = vec!["dQw4w9WgXcQ"; 51].join(",");
    let response = live_app()
        .oneshot(get(&format!("/metadata?ids={ids}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Maximum 50 video IDs per request"
    );
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
        let request = Request::builder()
            .method(method.clone())
            .uri("/metadata?ids=dQw4w9WgXcQ")
            .body(Body::empty())
            .unwrap();
        let response = live_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        // HEAD responses carry no body.
        if method != Method::HEAD {
            assert_eq!(json_body(response).await["error"], "Method not allowed");
        }
    }
}

#[tokio::test]
async fn head_never_reaches_the_pipeline() {
    let orchestrator = Arc::new(
        Huginn::builder()
            .provider(Arc::new(EchoProvider))
            .build()
            .unwrap(),
    );
    let app = router(Arc::clone(&orchestrator), &RouterConfig::default());

    for uri in ["/metadata?ids=dQw4w9WgXcQ", "/health"] {
        let request = Request::builder()
            .method(Method::HEAD)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
    }
    assert_eq!(orchestrator.limiter().tracked_keys(), 0);
    assert!(orchestrator.cache().is_empty());
}

#[tokio::test]
async fn unparsable_query_is_json_bad_request() {
    let response = live_app()
        .oneshot(get("/metadata?ids=dQw4w9WgXcQ&ids=9bZkp7q19f0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(
        json_body(response).await["error"],
        "Missing required parameter: ids (comma-separated video IDs)"
    );
}

#[tokio::test]
async fn sixty_first_miss_from_one_client_is_rate_limited() {
    let app = live_app();

    for i in 0..60 {
        let request = Request::builder()
            .uri(format!("/metadata?ids=video{i:06}"))
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {i}");
    }

    let request = Request::builder()
        .uri("/metadata?ids=video999999")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(json_body(response).await["error"], "Too many requests");

    // Cached IDs are still served to the limited client.
    let request = Request::builder()
        .uri("/metadata?ids=video000000")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["source"], "cached");

    // A different client is unaffected.
    let request = Request::builder()
        .uri("/metadata?ids=video999999")
        .header("x-real-ip", "198.51.100.2")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn preflight_from_allowed_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/metadata")
        .header(header::ORIGIN, "https://pastelsketchbook.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = live_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://pastelsketchbook.org"
    );
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(methods.contains("GET") && methods.contains("OPTIONS"), "{methods}");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");
}

#[tokio::test]
async fn disallowed_origin_gets_no_cors_header() {
    let request = Request::builder()
        .uri("/metadata?ids=dQw4w9WgXcQ")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = live_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

#[tokio::test]
async fn plain_options_is_ok() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/metadata")
        .body(Body::empty())
        .unwrap();
    let response = live_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// /health
// ============================================================================

#[tokio::test]
async fn health_reports_healthy_with_live_and_snapshot() {
    let app = app_from(
        Huginn::builder()
            .provider(Arc::new(EchoProvider))
            .fallback_snapshot(FallbackSnapshot {
                videos: vec![VideoMetadata::placeholder("dQw4w9WgXcQ")],
                generated_at: None,
            }),
    );
    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["api"]["status"], "ok");
    assert!(body["checks"]["api"]["responseTimeMs"].is_number());
}

#[tokio::test]
async fn health_reports_degraded_as_503() {
    let app = app_from(
        Huginn::builder()
            .provider(Arc::new(DownProvider))
            .disable_retry()
            .fallback_snapshot(FallbackSnapshot {
                videos: vec![VideoMetadata::placeholder("dQw4w9WgXcQ")],
                generated_at: None,
            }),
    );
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["status"], "degraded");
}

#[tokio::test]
async fn health_reports_unhealthy_as_500() {
    let app = app_from(Huginn::builder());
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["environment"]["status"], "failed");
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let response = live_app().oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
