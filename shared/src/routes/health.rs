// ============================================================================
// Health and Metrics Endpoints
// ============================================================================

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::context::AppContext;
use notehub_error::AppResult;

/// Response for GET /health
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub version: String,
    pub database: String,
}

/// GET /health
///
/// Reports liveness plus database connectivity. Returns 503 when the
/// database ping fails so orchestrators stop routing traffic here.
pub async fn health_check(State(context): State<Arc<AppContext>>) -> impl IntoResponse {
    let database_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&*context.db_pool)
        .await
        .is_ok();

    if !database_ok {
        tracing::warn!(service = context.service_name, "Database ping failed");
    }

    let health = HealthCheck {
        status: if database_ok { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        service: context.service_name.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_ok {
            "connected"
        } else {
            "disconnected"
        }
        .to_string(),
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(health))
}

/// GET /metrics
///
/// Prometheus exposition format.
pub async fn metrics() -> AppResult<String> {
    Ok(notehub_metrics::gather_metrics()?)
}
