// ============================================================================
// Notes Service
// ============================================================================
//
// Standalone notes CRUD service for the microservices deployment.
// Handles:
// - Note create/read/update/delete, scoped to the authenticated owner
// - Folder-filtered listing
//
// Architecture:
// - Stateless: JWTs are verified locally with the shared secret, so no
//   calls back to an auth service are needed
// - Horizontally scalable
//
// ============================================================================

use anyhow::{Context, Result};
use notehub_config::{bind_address_for, Config};
use notehub_core::auth::AuthManager;
use notehub_core::context::AppContext;
use notehub_core::db;
use notehub_core::rate_limit::{spawn_sweeper, RateLimiter};
use notehub_core::routes::create_notes_router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::from_env()?);
    let bind_address = bind_address_for("NOTES_SERVICE_PORT", 8001);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Notes Service Starting ===");

    // Initialize database
    info!("Connecting to database...");
    let db_pool = Arc::new(
        db::create_pool(&config.database_url, &config.db)
            .await
            .context("Failed to connect to database")?,
    );
    info!("Connected to database");

    // Apply database migrations
    info!("Applying database migrations...");
    sqlx::migrate!("../shared/migrations")
        .run(&*db_pool)
        .await
        .context("Failed to apply database migrations")?;
    info!("Database migrations applied successfully");

    // Initialize auth manager
    let auth_manager =
        Arc::new(AuthManager::new(&config).context("Failed to initialize auth manager")?);

    // Initialize rate limiter and its background sweeper
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
    spawn_sweeper(rate_limiter.clone());

    // Create application context
    let context = Arc::new(AppContext::new(
        db_pool,
        auth_manager,
        rate_limiter,
        config.clone(),
        "notes-service",
    ));

    // Create router
    let app = create_notes_router(context);

    // Start server
    info!("Notes Service listening on {}", bind_address);

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
