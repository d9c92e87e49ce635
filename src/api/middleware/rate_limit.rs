//! Per-client rate limiting for the API.

use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use serde_json::json;
use std::sync::Arc;
use tower_governor::{
    GovernorError, GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor},
};

use crate::error::AppError;

pub const TOO_MANY_REQUESTS_MESSAGE: &str =
    "Too many requests from this IP, please try again in an hour!";

/// Seconds between two replenished requests.
const REPLENISH_SECONDS: u64 = 36;

/// Requests a client can make before it has to wait for replenishment.
const BURST_SIZE: u32 = 100;

/// How clients are told apart, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitMode {
    Disabled,
    /// Socket peer address.
    PeerIp,
    /// `X-Forwarded-For`, `X-Real-Ip` or `Forwarded`, falling back to the peer
    /// address. Only safe behind a proxy that sets these headers.
    Proxied,
}

impl RateLimitMode {
    pub fn from_proxy_setting(behind_proxy: bool) -> Self {
        if behind_proxy {
            RateLimitMode::Proxied
        } else {
            RateLimitMode::PeerIp
        }
    }
}

/// Answers rejected requests in the API error format. Headers set by the
/// limiter (`retry-after` and friends) are kept.
fn rejection(error: GovernorError) -> Response {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut response = AppError::too_many_requests(
                TOO_MANY_REQUESTS_MESSAGE,
                json!({ "retryAfter": wait_time }),
            )
            .into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        other => Response::from(other),
    }
}

/// Rate limiter keyed by the peer IP.
///
/// # Limits
///
/// - **Burst**: 100 requests
/// - **Replenish**: one request every 36 seconds (100 per hour)
///
/// Requests exceeding the limit receive `429 Too Many Requests` with
/// [`TOO_MANY_REQUESTS_MESSAGE`]. Requires the
/// service to be started with `into_make_service_with_connect_info`.
pub fn layer() -> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>
{
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(REPLENISH_SECONDS)
            .burst_size(BURST_SIZE)
            .finish()
            .expect("rate limit settings are non-zero"),
    );

    GovernorLayer::new(governor_conf).error_handler(rejection)
}

/// Same limits as [`layer`], keyed by the client IP reported by the proxy.
pub fn proxied_layer()
-> GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(REPLENISH_SECONDS)
            .burst_size(BURST_SIZE)
            .finish()
            .expect("rate limit settings are non-zero"),
    );

    GovernorLayer::new(governor_conf).error_handler(rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};

    #[test]
    fn test_rejection_keeps_limiter_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("36"));

        let response = rejection(GovernorError::TooManyRequests {
            wait_time: 36,
            headers: Some(headers),
        });

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "36");
    }
}
