//! Serverless gateway adapter
//!
//! Runs the catalog router inside the AWS Lambda runtime. `lambda_http`
//! converts API Gateway events into `http::Request`s and converts the router's
//! responses back into gateway envelopes. Method, headers, query and body pass
//! through untouched; only the deployment-stage prefix is removed from the
//! path so that routes declared at `/items` still match `/dev/items`.

use anyhow::{Result, anyhow};
use http::{Request, Uri, uri::PathAndQuery};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, info};

use crate::logs::{LogFormat, init_logging_and_metrics};
use crate::server::{router, with_tracing};
use crate::store::CatalogStore;

/// Configuration for running under the Lambda runtime
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base_path: String,
}

/// Start serving gateway events
pub async fn start_lambda(config: GatewayConfig) -> Result<()> {
    // Initialize structured logging and metrics
    init_logging_and_metrics(LogFormat::Json);
    // Output debugging information
    info!(base_path = %config.base_path, "Starting gateway adapter");
    // Create the catalog for this instance
    let store = CatalogStore::seeded();
    info!(items = store.count().await, "Catalog seeded");
    // Wrap the router so stage-prefixed paths reach the right routes
    let service = StripBasePathLayer::new(&config.base_path).layer(with_tracing(router(store)));
    // Hand control to the Lambda runtime; no startup or shutdown hooks run
    lambda_http::run(service)
        .await
        .map_err(|e| anyhow!("Lambda runtime failed: {e}"))
}

/// Layer that removes a fixed base path from incoming request paths
#[derive(Debug, Clone)]
pub struct StripBasePathLayer {
    base_path: Arc<str>,
}

impl StripBasePathLayer {
    /// Create the layer, normalising `dev`, `/dev` and `/dev/` to `/dev`
    pub fn new(base_path: &str) -> Self {
        let trimmed = base_path.trim().trim_matches('/');
        let base_path = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        Self {
            base_path: base_path.into(),
        }
    }
}

impl<S> Layer<S> for StripBasePathLayer {
    type Service = StripBasePath<S>;

    fn layer(&self, inner: S) -> Self::Service {
        StripBasePath {
            inner,
            base_path: self.base_path.clone(),
        }
    }
}

/// Service produced by [`StripBasePathLayer`]
#[derive(Debug, Clone)]
pub struct StripBasePath<S> {
    inner: S,
    base_path: Arc<str>,
}

impl<S, B> Service<Request<B>> for StripBasePath<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if let Some(uri) = strip_base_path(req.uri(), &self.base_path) {
            debug!(from = %req.uri(), to = %uri, "Stripped base path");
            *req.uri_mut() = uri;
        }
        self.inner.call(req)
    }
}

/// Return the URI with `base_path` removed, or `None` if it does not apply
///
/// The prefix must end on a segment boundary: `/dev/items` and `/dev` are
/// rewritten, `/devices` is not. The query string is preserved.
pub fn strip_base_path(uri: &Uri, base_path: &str) -> Option<Uri> {
    if base_path.is_empty() {
        return None;
    }
    let rest = uri.path().strip_prefix(base_path)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let path = if rest.is_empty() { "/" } else { rest };
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_layer_normalises_base_path() {
        assert_eq!(&*StripBasePathLayer::new("dev").base_path, "/dev");
        assert_eq!(&*StripBasePathLayer::new("/dev/").base_path, "/dev");
        assert_eq!(&*StripBasePathLayer::new("/").base_path, "");
        assert_eq!(&*StripBasePathLayer::new("").base_path, "");
    }

    #[test]
    fn test_strip_prefixed_path() {
        assert_eq!(
            strip_base_path(&uri("/dev/items/1"), "/dev"),
            Some(uri("/items/1"))
        );
        assert_eq!(strip_base_path(&uri("/dev"), "/dev"), Some(uri("/")));
        assert_eq!(strip_base_path(&uri("/dev/"), "/dev"), Some(uri("/")));
    }

    #[test]
    fn test_strip_keeps_query_and_authority() {
        assert_eq!(
            strip_base_path(&uri("https://api.example.com/dev/items?x=1"), "/dev"),
            Some(uri("https://api.example.com/items?x=1"))
        );
    }

    #[test]
    fn test_strip_ignores_other_paths() {
        assert_eq!(strip_base_path(&uri("/items/1"), "/dev"), None);
        assert_eq!(strip_base_path(&uri("/devices"), "/dev"), None);
        assert_eq!(strip_base_path(&uri("/dev/items"), ""), None);
    }

    #[tokio::test]
    async fn test_prefixed_request_reaches_route() {
        let service = StripBasePathLayer::new("/dev").layer(router(CatalogStore::seeded()));
        let request = Request::builder()
            .uri("/dev/items/2")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let item: Item = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(item.id, 2);
        assert_eq!(item.name, "Mouse");
    }

    #[tokio::test]
    async fn test_unprefixed_request_still_matches() {
        let service = StripBasePathLayer::new("/dev").layer(router(CatalogStore::seeded()));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = service.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gateway_body_passes_through() {
        let service = StripBasePathLayer::new("/dev").layer(router(CatalogStore::seeded()));
        let request = Request::builder()
            .method("POST")
            .uri("/dev/items")
            .header("content-type", "application/json")
            .body(lambda_http::Body::Text(
                r#"{"name":"Monitor","price":199.99}"#.to_string(),
            ))
            .unwrap();
        let response = service.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["id"], json!(4));
        assert_eq!(body["name"], json!("Monitor"));
    }
}
