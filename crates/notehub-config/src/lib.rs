// ============================================================================
// NoteHub Config - Centralized configuration management
// ============================================================================
//
// This crate provides centralized configuration for all NoteHub services.
// Supports loading from environment variables with sensible defaults.
//
// ============================================================================

mod constants;
mod database;
mod gateway;
mod logging;
mod rate_limit;
mod security;

// Re-export all public types
pub use database::DbConfig;
pub use gateway::GatewayConfig;
pub use logging::LoggingConfig;
pub use rate_limit::RateLimitConfig;
pub use security::SecurityConfig;

use anyhow::Result;
use constants::*;

/// Main configuration structure for NoteHub services
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,

    /// Symmetric JWT signing secret (HS256), shared by every service that
    /// verifies tokens. Empty means unconfigured; the auth manager refuses
    /// to start without it.
    pub jwt_secret: String,

    /// Access token TTL in minutes (short-lived)
    pub access_token_ttl_minutes: i64,

    /// Refresh token TTL in days (long-lived for user convenience)
    pub refresh_token_ttl_days: i64,

    pub port: u16,
    pub bind_address: String,
    pub rust_log: String,

    // Sub-configurations
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub gateway: GatewayConfig,
    pub db: DbConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),

            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_default(),

            access_token_ttl_minutes: std::env::var("ACCESS_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),

            refresh_token_ttl_days: std::env::var("REFRESH_TOKEN_TTL_DAYS")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_DAYS),

            port,
            bind_address: format!("0.0.0.0:{}", port),

            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),

            logging: LoggingConfig::from_env(),
            security: SecurityConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            gateway: GatewayConfig::from_env(),
            db: DbConfig::from_env(),
        })
    }
}

/// Resolve a service bind address from a service-specific port variable,
/// falling back to `PORT`, then to the given default.
///
/// Lets each binary keep its own conventional port (gateway 8080, notes
/// 8001, folders 8002) while one compose file can still override all of
/// them uniformly.
pub fn bind_address_for(port_env: &str, default_port: u16) -> String {
    let port: u16 = std::env::var(port_env)
        .ok()
        .and_then(|p| p.parse().ok())
        .or_else(|| {
            std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
        })
        .unwrap_or(default_port);
    format!("0.0.0.0:{}", port)
}
