//! Router extension for oneshot calls
//!
//! Drives the Router directly without going through the network stack.
//! Used by the in-process HTTP tests.

use axum::Router;
use axum::body::Body;
use http::{Request, Response};
use tower::ServiceExt;

use crate::core::ServerState;

/// Result type for oneshot API calls
pub type OneshotResult = Result<Response<Body>, std::convert::Infallible>;

/// Extension trait for Router to support oneshot calls
///
/// # Example
///
/// ```ignore
/// let state = ServerState::initialize(&config)?;
/// let app = build_app(&state);
/// let request = Request::builder().uri("/health").body(Body::empty())?;
/// let response = app.oneshot_with(&state, request).await?;
/// ```
#[async_trait::async_trait]
pub trait OneshotRouter {
    /// Process a single request with the given state applied
    async fn oneshot_with(&self, state: &ServerState, request: Request<Body>) -> OneshotResult;
}

#[async_trait::async_trait]
impl OneshotRouter for Router<ServerState> {
    async fn oneshot_with(&self, state: &ServerState, request: Request<Body>) -> OneshotResult {
        // Clone router and apply state, then call as Service
        self.clone().with_state(state.clone()).oneshot(request).await
    }
}
