// ============================================================================
// Security Configuration
// ============================================================================

/// Browser-facing security policies
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    /// Origins allowed by CORS (comma-separated env, `*` allows any)
    pub cors_origins: Vec<String>,
    /// Host header values accepted by the server (`*` allows any)
    pub trusted_hosts: Vec<String>,
    /// Whether to emit Strict-Transport-Security (only behind HTTPS)
    pub enable_hsts: bool,
}

impl SecurityConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            cors_origins: std::env::var("CORS_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec!["*".to_string()]),
            trusted_hosts: std::env::var("TRUSTED_HOSTS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|h| h.trim().to_string())
                        .filter(|h| !h.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec!["*".to_string()]),
            enable_hsts: std::env::var("ENABLE_HSTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}
