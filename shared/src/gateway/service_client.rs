// ============================================================================
// Service Client
// ============================================================================
//
// HTTP client for communicating with the backend services.
// Handles:
// - Request forwarding
// - Response relaying
// - Upstream error mapping (503 unavailable, 504 timeout)
// - Health probes
//
// ============================================================================

use axum::body::Body;
use axum::http::{Request, Response};
use std::time::Duration;
use tracing::warn;

use notehub_error::AppError;
use notehub_metrics::{GATEWAY_REQUESTS_TOTAL, GATEWAY_REQUEST_DURATION_SECONDS};

/// HTTP client for forwarding requests to the backend services
pub struct ServiceClient {
    client: reqwest::Client,
    health_probe_timeout: Duration,
}

impl ServiceClient {
    pub fn new(timeout_secs: u64, health_probe_timeout_secs: u64) -> Self {
        // Configure connection pooling and keep-alive
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            health_probe_timeout: Duration::from_secs(health_probe_timeout_secs),
        }
    }

    /// Forward an HTTP request to an upstream service.
    ///
    /// `path_and_query` is the rewritten downstream path; the caller strips
    /// the gateway's own `/api` prefix before forwarding. The upstream
    /// response passes through unmodified: status, headers and body.
    pub async fn forward(
        &self,
        service_name: &str,
        service_url: &str,
        path_and_query: &str,
        request: Request<Body>,
    ) -> Result<Response<Body>, AppError> {
        let target_url = format!("{}{}", service_url, path_and_query);

        let method = request.method().clone();
        let headers = request.headers().clone();

        // Read body
        let (_parts, body) = request.into_parts();
        let body_bytes = axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read request body");
            AppError::internal("Failed to read request body")
        })?;

        let mut upstream_request = self.client.request(method, &target_url);

        // Copy headers (except Host, which reqwest sets for the target)
        for (key, value) in headers.iter() {
            if key != "host" {
                upstream_request = upstream_request.header(key, value);
            }
        }

        if !body_bytes.is_empty() {
            upstream_request = upstream_request.body(body_bytes.to_vec());
        }

        let timer = GATEWAY_REQUEST_DURATION_SECONDS
            .with_label_values(&[service_name])
            .start_timer();
        let result = upstream_request.send().await;
        timer.observe_duration();

        match result {
            Ok(response) => {
                let status = response.status();
                GATEWAY_REQUESTS_TOTAL
                    .with_label_values(&[service_name, status.as_str()])
                    .inc();

                // Convert the reqwest response back into an Axum response
                let mut relayed = Response::builder().status(status);
                for (key, value) in response.headers().iter() {
                    relayed = relayed.header(key, value);
                }

                let response_bytes = response.bytes().await.map_err(|e| {
                    tracing::error!(
                        error = %e,
                        service = service_name,
                        "Failed to read upstream response body"
                    );
                    AppError::UpstreamUnavailable(format!("{} is unavailable", service_name))
                })?;

                relayed.body(Body::from(response_bytes.to_vec())).map_err(|e| {
                    tracing::error!(error = %e, "Failed to build relayed response");
                    AppError::internal("Failed to relay upstream response")
                })
            }
            Err(e) => {
                // Clients get the service name only, never the upstream URL
                let app_error = if e.is_timeout() {
                    GATEWAY_REQUESTS_TOTAL
                        .with_label_values(&[service_name, "504"])
                        .inc();
                    AppError::UpstreamTimeout(format!("{} timed out", service_name))
                } else {
                    GATEWAY_REQUESTS_TOTAL
                        .with_label_values(&[service_name, "503"])
                        .inc();
                    AppError::UpstreamUnavailable(format!("{} is unavailable", service_name))
                };

                tracing::error!(
                    error = %e,
                    service = service_name,
                    target_url = %target_url,
                    "Failed to forward request"
                );
                Err(app_error)
            }
        }
    }

    /// Check if a service is healthy
    pub async fn check_health(&self, service_url: &str) -> bool {
        let health_url = format!("{}/health", service_url);
        match self
            .client
            .get(&health_url)
            .timeout(self.health_probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(service_url = %service_url, error = %e, "Service health check failed");
                false
            }
        }
    }
}
