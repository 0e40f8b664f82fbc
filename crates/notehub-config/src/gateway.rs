// ============================================================================
// API Gateway Configuration
// ============================================================================

use crate::constants::{DEFAULT_GATEWAY_TIMEOUT_SECS, DEFAULT_HEALTH_PROBE_TIMEOUT_SECS};

/// Where the gateway forwards requests, and how long it waits.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL of the notes service
    pub notes_service_url: String,
    /// Base URL of the folders service
    pub folders_service_url: String,
    /// Per-request forwarding timeout (seconds)
    pub timeout_secs: u64,
    /// Timeout for upstream health probes (seconds)
    pub health_probe_timeout_secs: u64,
}

impl GatewayConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            notes_service_url: std::env::var("NOTES_SERVICE_URL")
                .unwrap_or_else(|_| "http://notes-service:8001".to_string()),
            folders_service_url: std::env::var("FOLDERS_SERVICE_URL")
                .unwrap_or_else(|_| "http://folders-service:8002".to_string()),
            timeout_secs: std::env::var("GATEWAY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_GATEWAY_TIMEOUT_SECS),
            health_probe_timeout_secs: std::env::var("HEALTH_PROBE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_HEALTH_PROBE_TIMEOUT_SECS),
        }
    }
}
