use anyhow::{Result, anyhow, bail};
use axum::Router;
use axum::extract::{ConnectInfo, Request};
use axum::response::IntoResponse;
use metrics::counter;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    GovernorLayer, errors::GovernorError, governor::GovernorConfigBuilder,
    key_extractor::KeyExtractor,
};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Key extractor that identifies clients by forwarded address headers
///
/// Behind the serverless gateway there is no peer socket, so the gateway's
/// forwarding headers are preferred and the socket address is only a fallback.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;

    fn extract<B>(&self, req: &Request<B>) -> Result<Self::Key, GovernorError> {
        // Try the forwarding headers in order of preference
        let ip = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                req.headers()
                    .get("X-Real-IP")
                    .and_then(|h| h.to_str().ok())
                    .map(|s| s.trim())
            });
        // If we find an identifying key, use it
        if let Some(ip) = ip {
            debug!(ip = ip, "Extracted client address from headers");
            return Ok(ip.to_string());
        }
        // Otherwise, try to retrieve the connection info
        if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
            debug!(ip = ?addr.ip(), "Extracted client address from socket");
            return Ok(addr.ip().to_string());
        }
        // If we don't find an identifying key, use a default key
        warn!("Could not extract client address from request, using default key");
        Ok("unknown".to_string())
    }
}

/// Wrap a router with a per-client rate limiter
///
/// Each client may send `burst` requests at once, after which one request
/// is replenished every `1 / rps` seconds.
pub fn with_rate_limit(router: Router, rps: u32, burst: u32) -> Result<Router> {
    // Output debugging information
    debug!(rps, burst, "Configuring the HTTP rate limiter");
    // A zero rate would never replenish
    if rps == 0 {
        bail!("Invalid rate limit configuration: rps must be greater than zero");
    }
    // Create the rate limit configuration
    let config = GovernorConfigBuilder::default()
        .period(Duration::from_secs(1) / rps)
        .burst_size(burst)
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit configuration: rps={rps}, burst={burst}"))?;
    // Create the rate limit layer
    let layer = GovernorLayer::new(Arc::new(config)).error_handler(|e| {
        // Output debugging information
        warn!("Rate limit exceeded: {e}");
        // Increment rate limit error metrics
        counter!("itemcatalog.rate_limit_errors").increment(1);
        // Return the error response
        ApiError::TooManyRequests.into_response()
    });
    // Return the rate limited router
    Ok(router.layer(layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::router;
    use crate::store::CatalogStore;
    use axum::body::Body;
    use axum::http::{self, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn from_client(ip: &str) -> http::Request<Body> {
        http::Request::builder()
            .uri("/")
            .header("X-Real-IP", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_prefers_forwarded_for() {
        let req = http::Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), "203.0.113.7");
    }

    #[test]
    fn test_extract_falls_back_to_real_ip() {
        let req = http::Request::builder()
            .header("X-Real-IP", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), "198.51.100.2");
    }

    #[test]
    fn test_extract_uses_socket_address() {
        let mut req = http::Request::builder().body(Body::empty()).unwrap();
        let addr: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), "192.0.2.10");
    }

    #[test]
    fn test_extract_defaults_to_unknown() {
        let req = http::Request::builder().body(Body::empty()).unwrap();
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), "unknown");
    }

    #[test]
    fn test_invalid_limits_are_rejected() {
        assert!(with_rate_limit(router(CatalogStore::seeded()), 0, 10).is_err());
        assert!(with_rate_limit(router(CatalogStore::seeded()), 5, 0).is_err());
        assert!(with_rate_limit(router(CatalogStore::seeded()), 5, 10).is_ok());
    }

    #[tokio::test]
    async fn test_requests_over_the_limit_are_rejected() {
        let app = with_rate_limit(router(CatalogStore::seeded()), 10, 1).unwrap();

        let response = app.clone().oneshot(from_client("203.0.113.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(from_client("203.0.113.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"detail": "Too Many Requests"}));

        // Other clients have their own budget
        let response = app.oneshot(from_client("203.0.113.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_budget_replenishes_at_configured_rate() {
        // At 10 requests per second a new request is allowed every 100ms
        let app = with_rate_limit(router(CatalogStore::seeded()), 10, 1).unwrap();

        let response = app.clone().oneshot(from_client("198.51.100.9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(250)).await;

        let response = app.oneshot(from_client("198.51.100.9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
