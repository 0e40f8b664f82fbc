// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Salt mixed into hashed user identifiers before they reach logs
    pub hash_salt: String,
}

impl LoggingConfig {
    pub(crate) fn from_env() -> Self {
        let hash_salt =
            std::env::var("LOG_HASH_SALT").unwrap_or_else(|_| "notehub-dev-salt".to_string());
        if hash_salt == "notehub-dev-salt" {
            tracing::warn!(
                "LOG_HASH_SALT not set - hashed identifiers in logs are linkable across deployments"
            );
        }
        Self { hash_salt }
    }
}
