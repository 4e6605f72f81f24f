//! Axum-based HTTP relay surface with body limits and timeouts.
//!
//! - Proper HTTP/1.1 parsing and compliance
//! - Content-Length validation (handled by hyper)
//! - Request body size limits (1MB max, documents ride along in the JSON)
//! - Request timeouts (30s) to prevent slow-loris attacks
//!
//! The webhook deadline is separate and much tighter; see
//! `config.webhook.timeout_ms`.

mod handlers;

use handlers::{handle_chat, handle_health};

use crate::config::Config;
use crate::response::HeaderCache;
use crate::webhook::WebhookClient;
use anyhow::Result;
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

/// Maximum request body size (1MB) — whole documents ride along in the payload
pub const MAX_BODY_SIZE: usize = 1_000_000;
/// Request timeout (30s) — prevents slow-loris attacks
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub webhook: Arc<WebhookClient>,
    pub headers: Arc<HeaderCache>,
}

/// Run the HTTP relay using axum.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    run_gateway_with_listener(listener, config).await
}

/// Run the HTTP relay from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let local_addr = listener.local_addr()?;

    let state = AppState {
        webhook: Arc::new(WebhookClient::new(&config.webhook)),
        headers: Arc::new(HeaderCache::new(config.cache.header_entries)),
    };

    info!("relay listening on {local_addr}");
    info!("forwarding chat payloads to {}", state.webhook.url());
    info!(
        "header cache capacity: {} entries",
        config.cache.header_entries
    );

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/chat", post(handle_chat))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ));

    axum::serve(listener, app).await?;

    Ok(())
}
