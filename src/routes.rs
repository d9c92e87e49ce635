//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`   - Health check (public)
//! - `/api/v1/*`      - REST API, rate limited per client IP
//! - anything else    - `404` in the JSON error format
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Error reports** - Detailed error bodies in development mode
//! - **Body limit** - Request bodies up to 10 KiB
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Path normalization** - Trailing slash handling

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api;
use crate::api::handlers::{health_handler, not_found};
use crate::api::middleware::rate_limit::{self, RateLimitMode};
use crate::api::middleware::{error_report, tracing};
use crate::state::AppState;

/// Maximum accepted request body size.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024;

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `rate_limit` - how `/api` clients are keyed for rate limiting;
///   [`RateLimitMode::PeerIp`] needs the service to be served with connect info
pub fn app_router(state: AppState, rate_limit: RateLimitMode) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state, rate_limit))
}

/// The router without path normalization.
pub fn build_router(state: AppState, rate_limit: RateLimitMode) -> Router {
    let api_router = api::routes::api_routes(&state);
    let api_router = match rate_limit {
        RateLimitMode::Disabled => api_router,
        RateLimitMode::PeerIp => api_router.layer(rate_limit::layer()),
        RateLimitMode::Proxied => api_router.layer(rate_limit::proxied_layer()),
    };

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", api_router)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error_report::layer,
        ))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
        .layer(tracing::layer())
}
