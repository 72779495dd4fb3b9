//! Request-level middleware.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) unless the client sent one
//! - Echo the request ID on the response
//! - Trace every request
//! - Enforce the body size limit and the request timeout
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body limit enforced by tower-http, axum's own default limit disabled

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Wrap `router` with the ingress middleware stack.
#[allow(deprecated)]
pub fn with_middleware(router: Router, max_body_bytes: usize, request_timeout: Duration) -> Router {
    router.layer(DefaultBodyLimit::disable()).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(RequestBodyLimitLayer::new(max_body_bytes))
            .layer(TimeoutLayer::new(request_timeout)),
    )
}

/// The request ID assigned by [`with_middleware`], or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
