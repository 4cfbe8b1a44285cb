//! Axum HTTP facade: image upload with a streamed description, and the
//! agent run that turns a cached description into a recommendation.
//!
//! - `/runAgent` is bounded by a request timeout
//! - uploads are bounded by the configured body limit
//! - CORS is permissive (the facade carries no credentials)

pub mod cache;
mod handlers;

pub use cache::DescriptionCache;
pub use handlers::{DescribeQuery, REQUEST_ID_HEADER, RunAgentRequest};

use crate::agent::ClaimAgent;
use crate::config::GatewayConfig;
use crate::providers::ImageDescriber;
use crate::store::DocumentStore;
use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
};
use handlers::{handle_health, handle_image_descriptor, handle_root, handle_run_agent};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub describer: Arc<dyn ImageDescriber>,
    pub agent: Arc<ClaimAgent>,
    pub store: Arc<dyn DocumentStore>,
    pub cache: Arc<DescriptionCache>,
    pub vision_model: String,
    pub temperature: f64,
}

/// Build the router with its body-limit, timeout and CORS layers.
pub fn router(state: AppState, config: &GatewayConfig) -> Router {
    let agent_routes = Router::new()
        .route("/runAgent", post(handle_run_agent))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.agent_timeout_secs),
        ));

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/imageDescriptor", post(handle_image_descriptor))
        .merge(agent_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
}

/// Bind `host:port` and serve until the process stops.
pub async fn run_gateway(host: &str, port: u16, state: AppState, config: &GatewayConfig) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_gateway_with_listener(listener, state, config).await
}

/// Serve from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    state: AppState,
    config: &GatewayConfig,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "gateway listening");
    tracing::info!("  POST /imageDescriptor  → streamed description");
    tracing::info!("  POST /runAgent         → recommendation document");
    tracing::info!("  GET  /health");

    axum::serve(listener, router(state, config)).await?;
    Ok(())
}
