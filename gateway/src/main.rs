// ============================================================================
// API Gateway
// ============================================================================
//
// Single entry point for the microservices deployment.
// Handles:
// - Per-IP rate limiting at the edge
// - Request forwarding to notes-service and folders-service
// - Upstream health aggregation and a service overview endpoint
//
// The gateway holds no database connection and never touches JWTs; the
// services authenticate every forwarded request themselves.
//
// ============================================================================

use anyhow::{Context, Result};
use notehub_config::{bind_address_for, Config};
use notehub_core::gateway::{create_gateway_router, GatewayState};
use notehub_core::rate_limit::{spawn_sweeper, RateLimiter};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::from_env()?);
    let bind_address = bind_address_for("GATEWAY_PORT", 8080);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== API Gateway Starting ===");
    info!("Notes service: {}", config.gateway.notes_service_url);
    info!("Folders service: {}", config.gateway.folders_service_url);

    // Initialize rate limiter and its background sweeper
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
    spawn_sweeper(rate_limiter.clone());

    // Create gateway state
    let state = GatewayState::new(config, rate_limiter);

    // Create router
    let app = create_gateway_router(state);

    // Start server
    info!("API Gateway listening on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Failed to start server")?;

    Ok(())
}
