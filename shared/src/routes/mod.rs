// ============================================================================
// Axum Routes Module
// ============================================================================
//
// HTTP surface shared by the monolith and the standalone services. The
// monolith mounts everything; notes-service and folders-service each mount
// their own slice plus health and metrics.
//
// Structure:
// - mod.rs: Router assembly and the shared middleware stack
// - auth.rs: Registration, login, token refresh, profile
// - notes.rs: Note CRUD
// - folders.rs: Folder CRUD and tree operations
// - health.rs: Health check and metrics endpoints
// - extractors.rs: CurrentUser bearer-token extractor
// - middleware.rs: Rate limiting, request metrics, security headers, host filtering
//
// ============================================================================

pub mod auth; // Made public for response-shape assertions in integration tests
pub mod extractors; // Made public for binaries that mount extra authenticated routes
mod folders;
mod health;
mod middleware;
mod notes;

use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use notehub_config::Config;

/// Create the monolith router with every NoteHub route
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    let router = Router::new()
        // Health and monitoring (rate-limit exempt by default)
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        // Authentication and profile
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::get_me))
        .route("/auth/me", put(auth::update_me))
        // Notes CRUD
        .merge(notes_routes())
        // Folders CRUD
        .merge(folders_routes());

    apply_middleware(router, app_context)
}

/// Create the notes-service router: note CRUD plus health and metrics
pub fn create_notes_router(app_context: Arc<AppContext>) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .merge(notes_routes());

    apply_middleware(router, app_context)
}

/// Create the folders-service router: folder CRUD plus health and metrics
pub fn create_folders_router(app_context: Arc<AppContext>) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .merge(folders_routes());

    apply_middleware(router, app_context)
}

fn notes_routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/notes", post(notes::create_note))
        .route("/notes", get(notes::list_notes))
        .route("/notes/:id", get(notes::get_note))
        .route("/notes/:id", put(notes::update_note))
        .route("/notes/:id", delete(notes::delete_note))
}

fn folders_routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/folders", post(folders::create_folder))
        .route("/folders", get(folders::list_folders))
        .route("/folders/:id", get(folders::get_folder))
        .route("/folders/:id/children", get(folders::folder_children))
        .route("/folders/:id", put(folders::update_folder))
        .route("/folders/:id", delete(folders::delete_folder))
}

/// Attach the shared middleware stack and finalize the router state
fn apply_middleware(router: Router<Arc<AppContext>>, app_context: Arc<AppContext>) -> Router {
    router
        // Apply middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                // Tracing layer (outermost - runs first)
                .layer(TraceLayer::new_for_http())
                // Browser cross-origin access
                .layer(cors_layer(&app_context.config))
                // Gzip response bodies for clients that accept it
                .layer(CompressionLayer::new())
                .into_inner(),
        )
        // Security headers on every response
        .layer(axum::middleware::from_fn_with_state(
            app_context.clone(),
            middleware::security_headers,
        ))
        // Host allow-list
        .layer(axum::middleware::from_fn_with_state(
            app_context.clone(),
            middleware::trusted_hosts,
        ))
        // Per-client rate limiting
        .layer(axum::middleware::from_fn_with_state(
            app_context.clone(),
            middleware::rate_limit,
        ))
        // Request counters and latency histograms
        .layer(axum::middleware::from_fn_with_state(
            app_context.clone(),
            middleware::track_metrics,
        ))
        .with_state(app_context)
}

/// Build the CORS layer from configuration. A literal "*" opens the API to
/// any origin; otherwise only the listed origins are allowed.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins = &config.security.cors_origins;

    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}
