// ============================================================================
// HTTP Middleware
// ============================================================================
//
// Request-path middleware shared by the monolith and every service:
// - rate_limit: fixed-window throttling by client address
// - track_metrics: request counters and latency histograms per route
// - security_headers: standard hardening headers on every response
// - trusted_hosts: reject requests with an unexpected Host header
//
// ============================================================================

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::header::HOST,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::context::AppContext;
use crate::utils::{add_security_headers, extract_client_ip};
use notehub_error::AppError;
use notehub_metrics::{
    HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS, RATE_LIMITED_REQUESTS_TOTAL,
};

/// Fixed-window rate limiting by client address.
///
/// Exempt paths (health probes, metrics scrapes) bypass the limiter so
/// monitoring never gets throttled out.
pub async fn rate_limit(
    State(context): State<Arc<AppContext>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if context.rate_limiter.is_exempt(path) {
        return next.run(request).await;
    }

    let direct_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let client = extract_client_ip(request.headers(), direct_ip);

    if let Err(e) = context.rate_limiter.check(&client) {
        RATE_LIMITED_REQUESTS_TOTAL
            .with_label_values(&[context.service_name])
            .inc();
        return e.into_response();
    }

    next.run(request).await
}

/// Record request count and latency for every route
pub async fn track_metrics(
    State(context): State<Arc<AppContext>>,
    request: Request,
    next: Next,
) -> Response {
    // Label by the route pattern, not the raw path, to keep cardinality low
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[context.service_name, &method, &route, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[context.service_name, &route])
        .observe(elapsed);

    response
}

/// Add security headers to every response
pub async fn security_headers(
    State(context): State<Arc<AppContext>>,
    request: Request,
    next: Next,
) -> Response {
    let enable_hsts = context.config.security.enable_hsts;
    let mut response = next.run(request).await;
    add_security_headers(response.headers_mut(), enable_hsts);
    response
}

/// Reject requests whose Host header is not in the trusted set.
/// A lone `*` in the set trusts every host.
pub async fn trusted_hosts(
    State(context): State<Arc<AppContext>>,
    request: Request,
    next: Next,
) -> Response {
    let trusted = &context.config.security.trusted_hosts;

    if trusted.iter().any(|h| h == "*") {
        return next.run(request).await;
    }

    // Compare without the port: "example.com:8080" matches "example.com"
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(|h| h.split(':').next().unwrap_or(h).to_string())
        .unwrap_or_default();

    if trusted.iter().any(|h| h == &host) {
        return next.run(request).await;
    }

    tracing::warn!(host = %host, "Rejected request from untrusted host");
    AppError::validation("Invalid host header").into_response()
}
