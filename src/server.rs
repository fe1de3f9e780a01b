//! HTTP read surface for the published state.
//!
//! This module provides an HTTP server that:
//! - Serves the latest published snapshot via GET /state
//! - Answers liveness probes via GET /health
//!
//! # Architecture
//!
//! ```text
//! Sensor Link ──→ ingest loop ──→ StatePublisher ──→ GET /state ──→ pollers
//! ```
//!
//! Handlers never touch the pipeline: they clone the current `Arc` snapshot
//! out of the publisher and serialize it. Any number of pollers may hit the
//! endpoint concurrently without slowing ingestion.

use crate::publish::StatePublisher;
use axum::{
    extract::State,
    http::HeaderValue,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /state
///
/// Returns the most recently published snapshot. Always succeeds; before any
/// data has arrived the snapshot carries absent metrics and a neutral state.
async fn state(
    State(publisher): State<Arc<StatePublisher>>,
) -> Json<crate::publish::PublishedState> {
    Json((*publisher.read()).clone())
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    publisher: Arc<StatePublisher>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = Router::new()
        .route("/health", get(health))
        .route("/state", get(state))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(publisher);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Vital affect agent listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
