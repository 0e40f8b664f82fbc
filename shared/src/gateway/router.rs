// ============================================================================
// Gateway Router
// ============================================================================
//
// Routes requests to the backend services based on path prefix. The gateway
// holds no business logic: it rate-limits, forwards, and reports upstream
// health. Authentication happens inside the services.
//
// Routing rules:
// - /api/notes*    → notes-service (prefix /api stripped)
// - /api/folders*  → folders-service (prefix /api stripped)
// - /api/services  → upstream overview with live health probes
// - /health        → aggregated gateway + upstream health
// - /metrics       → gateway Prometheus metrics
// - anything else  → 404
//
// ============================================================================

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::gateway::discovery::{ServiceDiscovery, StaticServiceDiscovery};
use crate::gateway::service_client::ServiceClient;
use crate::rate_limit::RateLimiter;
use crate::utils::extract_client_ip;
use notehub_config::Config;
use notehub_error::{AppError, AppResult};
use notehub_metrics::{GATEWAY_SERVICE_HEALTH, RATE_LIMITED_REQUESTS_TOTAL};

/// Label used on gateway-side metrics
const GATEWAY_SERVICE_NAME: &str = "api-gateway";

/// Gateway router state
pub struct GatewayState {
    pub config: Arc<Config>,
    pub service_discovery: Box<dyn ServiceDiscovery>,
    pub service_client: ServiceClient,
    pub rate_limiter: Arc<RateLimiter>,
}

impl GatewayState {
    pub fn new(config: Arc<Config>, rate_limiter: Arc<RateLimiter>) -> Arc<Self> {
        let gateway_config = Arc::new(config.gateway.clone());
        let service_discovery: Box<dyn ServiceDiscovery> =
            Box::new(StaticServiceDiscovery::new(gateway_config));
        let service_client = ServiceClient::new(
            config.gateway.timeout_secs,
            config.gateway.health_probe_timeout_secs,
        );

        Arc::new(Self {
            config,
            service_discovery,
            service_client,
            rate_limiter,
        })
    }
}

/// Create the gateway router
pub fn create_gateway_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        // Gateway-local endpoints
        .route("/health", get(gateway_health))
        .route("/metrics", get(metrics))
        .route("/api/services", get(services_overview))
        // Everything else is matched by prefix and forwarded
        .fallback(route_request)
        // Apply middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                // Tracing layer (outermost - runs first)
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        // Per-client rate limiting at the edge
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit,
        ))
        .with_state(state)
}

/// Pick the upstream for a gateway path
fn target_service(path: &str) -> Option<&'static str> {
    if path.starts_with("/api/notes") {
        Some("notes-service")
    } else if path.starts_with("/api/folders") {
        Some("folders-service")
    } else {
        None
    }
}

/// Strip the gateway prefix so upstreams see their own route space
fn downstream_path(path: &str, query: Option<&str>) -> String {
    let stripped = path.strip_prefix("/api").unwrap_or(path);
    match query {
        Some(query) => format!("{}?{}", stripped, query),
        None => stripped.to_string(),
    }
}

/// Forward a request to the service owning its path prefix
pub async fn route_request(
    State(state): State<Arc<GatewayState>>,
    request: Request<Body>,
) -> Result<Response, AppError> {
    let path = request.uri().path();

    let service_name = match target_service(path) {
        Some(name) => name,
        None => return Err(AppError::not_found("Route not found")),
    };

    let path_and_query = downstream_path(path, request.uri().query());

    let service_url = match state.service_discovery.get_service_url(service_name) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, service = service_name, "Failed to resolve service URL");
            return Err(AppError::internal("Unknown upstream service"));
        }
    };

    state
        .service_client
        .forward(service_name, &service_url, &path_and_query, request)
        .await
}

/// GET /api/services
///
/// Lists every routable upstream with its configured URL and a live
/// health probe result.
pub async fn services_overview(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    let mut services = serde_json::Map::new();

    for name in state.service_discovery.service_names() {
        let entry = match state.service_discovery.get_service_url(name) {
            Ok(url) => {
                let healthy = state.service_client.check_health(&url).await;
                set_health_gauge(name, healthy);
                json!({
                    "url": url,
                    "health": health_label(healthy),
                })
            }
            Err(e) => {
                tracing::error!(error = %e, service = name, "Failed to resolve service URL");
                json!({ "url": null, "health": "unknown" })
            }
        };
        services.insert((*name).to_string(), entry);
    }

    Json(json!({ "services": services }))
}

/// GET /health
///
/// Always answers 200; "degraded" means at least one upstream probe failed.
/// The gateway itself has no database, so its own liveness is implied by
/// the response.
pub async fn gateway_health(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    let mut services = serde_json::Map::new();
    let mut all_healthy = true;

    for name in state.service_discovery.service_names() {
        let healthy = match state.service_discovery.get_service_url(name) {
            Ok(url) => state.service_client.check_health(&url).await,
            Err(_) => false,
        };
        set_health_gauge(name, healthy);
        all_healthy &= healthy;
        services.insert((*name).to_string(), json!(health_label(healthy)));
    }

    Json(json!({
        "status": if all_healthy { "healthy" } else { "degraded" },
        "service": GATEWAY_SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "services": services,
    }))
}

/// GET /metrics
pub async fn metrics() -> AppResult<String> {
    Ok(notehub_metrics::gather_metrics()?)
}

fn health_label(healthy: bool) -> &'static str {
    if healthy {
        "healthy"
    } else {
        "unhealthy"
    }
}

fn set_health_gauge(service_name: &str, healthy: bool) {
    GATEWAY_SERVICE_HEALTH
        .with_label_values(&[service_name])
        .set(if healthy { 1.0 } else { 0.0 });
}

/// Per-client rate limiting at the gateway edge
pub async fn rate_limit(
    State(state): State<Arc<GatewayState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if state.rate_limiter.is_exempt(path) {
        return next.run(request).await;
    }

    let direct_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let client_ip = extract_client_ip(request.headers(), direct_ip);

    if let Err(e) = state.rate_limiter.check(&client_ip) {
        RATE_LIMITED_REQUESTS_TOTAL
            .with_label_values(&[GATEWAY_SERVICE_NAME])
            .inc();
        return e.into_response();
    }

    next.run(request).await
}
