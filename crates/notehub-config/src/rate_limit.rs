// ============================================================================
// Rate Limiting Configuration
// ============================================================================

use crate::constants::{DEFAULT_RATE_LIMIT_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS};

/// Fixed-window rate limiting policy, applied per client IP.
///
/// The limiter itself is per-process state; these knobs only shape the
/// window. Exempt paths (health probes, metrics scrapes) bypass the limiter
/// entirely so monitoring never gets throttled.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enforced at all
    pub enabled: bool,
    /// Maximum requests admitted per client within one window
    pub max_requests: usize,
    /// Window size in seconds
    pub window_secs: u64,
    /// Request paths that bypass the limiter
    pub exempt_paths: Vec<String>,
}

impl RateLimitConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            max_requests: std::env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_REQUESTS),
            window_secs: std::env::var("RATE_LIMIT_WINDOW_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            exempt_paths: std::env::var("RATE_LIMIT_EXEMPT_PATHS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec!["/health".to_string(), "/metrics".to_string()]),
        }
    }
}
