use anyhow::{Result, anyhow};
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::logs::{LogFormat, init_logging_and_metrics};
use crate::store::CatalogStore;
use crate::utils::generate_request_id;

pub mod extract;
pub mod handlers;
pub mod limit;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub store: CatalogStore,
}

/// Configuration for standalone server startup
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub rate_limit_rps: Option<u32>,
    pub rate_limit_burst: u32,
}

/// Build the catalog routes over the given store
pub fn router(store: CatalogStore) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route(
            "/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route("/items/{item_id}", get(handlers::get_item))
        .fallback(handlers::route_not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(AppState { store })
}

/// Wrap a router with per-request tracing
pub fn with_tracing(router: Router) -> Router {
    // Create tracing layer for request logging
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = generate_request_id();
            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            debug!(
                method = %request.method(),
                uri = %request.uri(),
                "HTTP request started"
            );
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                let status = response.status();
                if status.is_client_error() || status.is_server_error() {
                    warn!(
                        status = %status,
                        latency_ms = latency.as_millis(),
                        "HTTP request failed"
                    );
                } else {
                    info!(
                        status = %status,
                        latency_ms = latency.as_millis(),
                        "HTTP request completed"
                    );
                }
            },
        );
    router.layer(trace_layer)
}

/// Start the standalone HTTP server
pub async fn start_server(config: ServerConfig) -> Result<()> {
    // Extract configuration values
    let ServerConfig {
        bind_address,
        rate_limit_rps,
        rate_limit_burst,
    } = config;
    // Initialize structured logging and metrics
    init_logging_and_metrics(LogFormat::Text);
    // Output debugging information
    info!(
        bind_address = %bind_address,
        rate_limit_rps,
        rate_limit_burst,
        "Server configuration loaded"
    );
    // Create the catalog for this process
    let store = CatalogStore::seeded();
    info!(items = store.count().await, "Catalog seeded");
    // Create the router with request tracing
    let mut router = with_tracing(router(store));
    // Add rate limiting if configured
    if let Some(rps) = rate_limit_rps {
        router = limit::with_rate_limit(router, rps, rate_limit_burst)?;
    }
    // Create a TCP listener for the HTTP server
    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to address {bind_address}: {e}"))?;
    // Output debugging information
    info!(bind_address = %bind_address, "Starting HTTP server");
    // Serve the router, exposing peer addresses to the rate limiter
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    // Output debugging information
    info!("HTTP server stopped");
    // All ok
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
