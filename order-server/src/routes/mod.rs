use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue, Method, header};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::core::ServerState;

pub mod logging;
pub mod router_ext;
pub use router_ext::{OneshotResult, OneshotRouter};

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Order lifecycle + projections
        .merge(api::orders::router())
        // Inventory admission + stock management
        .merge(api::inventory::router())
        // Table assignments
        .merge(api::tables::router())
        // Health API - public route
        .merge(api::health::router())
}

fn cors_layer(state: &ServerState) -> CorsLayer {
    if state.config.is_production() {
        // 同源访问，只放行 API 用到的方法和头
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
    } else {
        CorsLayer::permissive()
    }
}

/// Build a fully configured application with all middleware
///
/// This is used by both the HTTP server and oneshot calls
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(cors_layer(state))
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Timeout - 408 when a handler exceeds the configured budget
        .layer(TimeoutLayer::new(Duration::from_millis(
            state.config.request_timeout_ms,
        )))
        // Request logging
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            logging::logging_middleware,
        ))
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // ========== Request ID ==========
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // Generate unique ID for each request (outermost, runs first)
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
}
