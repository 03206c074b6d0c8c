//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - The `/v1/media` REST routes
//! - Bearer credential middleware
//! - Error to response mapping
//! - Per-client rate limiting
//! - Cross-cutting layers: tracing, CORS, request ids, timeouts

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    http::{
        HeaderName, HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn_with_state,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info_span;

use crate::middleware::{RateLimiter, rate_limit_middleware};
use mediagate_core::assets::AssetService;
use mediagate_shared::{JwtService, config::ServerSettings};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service for credential verification.
    pub jwt_service: Arc<JwtService>,
    /// Asset orchestrators.
    pub assets: Arc<AssetService>,
}

/// Creates the main application router.
///
/// Per-client limiting keys on the socket peer, so serve the router with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState, server: &ServerSettings) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let mut router = Router::new().nest("/v1/media", routes::media_routes(state.clone()));
    if server.rate_limit_per_minute > 0 {
        let limiter = RateLimiter::per_minute(server.rate_limit_per_minute, server.trusted_proxies);
        router = router.layer(from_fn_with_state(Arc::new(limiter), rate_limit_middleware));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(cors_layer(&server.allowed_origins))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    server.request_timeout_secs,
                ))),
        )
        .with_state(state)
}

/// CORS policy. An empty list or a `*` entry allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o.trim()).ok()),
        )
    };

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE, request_id.clone()])
        .expose_headers([request_id])
}
