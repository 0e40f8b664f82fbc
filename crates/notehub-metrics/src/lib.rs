//! Prometheus metrics for NoteHub services
//!
//! Provides centralized metrics collection for monitoring:
//! - HTTP request volume and latency
//! - Rate limiter rejections
//! - Business events (registrations, notes, folders)
//! - Gateway forwarding and upstream health

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramVec, IntCounter, IntCounterVec, TextEncoder, opts,
    register_gauge_vec, register_histogram_vec, register_int_counter, register_int_counter_vec,
};

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Total HTTP requests handled (by service, method, route and status code).
/// Route is the matched pattern (`/notes/:id`), never the raw path, so
/// label cardinality stays bounded.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "notehub_http_requests_total",
            "Total number of HTTP requests handled"
        ),
        &["service", "method", "route", "status_code"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request duration in seconds (by service and route)
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "notehub_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["service", "route"]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Requests rejected by the rate limiter (by service)
pub static RATE_LIMITED_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "notehub_rate_limited_requests_total",
            "Requests rejected by the fixed-window rate limiter"
        ),
        &["service"]
    )
    .expect("Failed to register RATE_LIMITED_REQUESTS_TOTAL metric")
});

// ============================================================================
// Business Metrics
// ============================================================================

/// Total successful user registrations
pub static USERS_REGISTERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "notehub_users_registered_total",
        "Total number of users registered"
    ))
    .expect("Failed to register USERS_REGISTERED_TOTAL metric")
});

/// Total notes created
pub static NOTES_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "notehub_notes_created_total",
        "Total number of notes created"
    ))
    .expect("Failed to register NOTES_CREATED_TOTAL metric")
});

/// Total folders created
pub static FOLDERS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "notehub_folders_created_total",
        "Total number of folders created"
    ))
    .expect("Failed to register FOLDERS_CREATED_TOTAL metric")
});

// ============================================================================
// Gateway Metrics
// ============================================================================

/// Gateway requests total (by upstream service and status code)
pub static GATEWAY_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "notehub_gateway_requests_total",
            "Total number of requests forwarded by the gateway"
        ),
        &["service", "status_code"]
    )
    .expect("Failed to register GATEWAY_REQUESTS_TOTAL metric")
});

/// Gateway forwarding duration in seconds (by upstream service)
pub static GATEWAY_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "notehub_gateway_request_duration_seconds",
        "Gateway forwarding duration in seconds",
        &["service"]
    )
    .expect("Failed to register GATEWAY_REQUEST_DURATION_SECONDS metric")
});

/// Upstream service health status (1=healthy, 0=unhealthy)
pub static GATEWAY_SERVICE_HEALTH: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        opts!(
            "notehub_gateway_service_health",
            "Upstream service health status (1=healthy, 0=unhealthy)"
        ),
        &["service"]
    )
    .expect("Failed to register GATEWAY_SERVICE_HEALTH metric")
});

// ============================================================================
// Metrics Collection
// ============================================================================

/// Gather all registered metrics and encode as Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}
