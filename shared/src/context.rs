use std::sync::Arc;

use crate::auth::AuthManager;
use crate::db::DbPool;
use crate::rate_limit::RateLimiter;
use notehub_config::Config;

/// Application context containing shared dependencies
/// This reduces parameter passing and makes it easier to add new dependencies
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: Arc<DbPool>,
    pub auth_manager: Arc<AuthManager>,
    /// Per-process limiter; each service instance counts its own clients
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Arc<Config>,
    /// Service name used in log lines and metric labels
    pub service_name: &'static str,
}

impl AppContext {
    /// Creates a new application context
    pub fn new(
        db_pool: Arc<DbPool>,
        auth_manager: Arc<AuthManager>,
        rate_limiter: Arc<RateLimiter>,
        config: Arc<Config>,
        service_name: &'static str,
    ) -> Self {
        Self {
            db_pool,
            auth_manager,
            rate_limiter,
            config,
            service_name,
        }
    }
}
