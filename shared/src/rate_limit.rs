use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notehub_config::RateLimitConfig;
use notehub_error::AppError;

/// Fixed-window request throttling by client address, kept entirely in
/// process memory.
///
/// Key features:
/// - Per-client timestamp lists, pruned lazily on every check
/// - Background sweep task purging idle clients to bound memory
/// - Exempt path set (health probes, metrics scrapes)
/// - Constructed at startup and injected through AppContext, never a global
///
/// The policy is approximate: a client can burst across a window edge.
/// That is a known characteristic of fixed windows.
pub struct RateLimiter {
    clients: DashMap<String, Vec<Instant>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            clients: DashMap::new(),
            config,
        }
    }

    /// Whether a path bypasses the limiter entirely
    pub fn is_exempt(&self, path: &str) -> bool {
        self.config.exempt_paths.iter().any(|p| p == path)
    }

    /// Admit or reject one request from `client`
    pub fn check(&self, client: &str) -> Result<(), AppError> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Result<(), AppError> {
        if !self.config.enabled {
            return Ok(());
        }

        let window = Duration::from_secs(self.config.window_secs);
        let mut timestamps = self.clients.entry(client.to_string()).or_default();

        // Drop requests that have aged out of the window
        timestamps.retain(|t| now.duration_since(*t) < window);

        if timestamps.len() >= self.config.max_requests {
            tracing::warn!(
                client = %client,
                count = timestamps.len(),
                limit = self.config.max_requests,
                window_secs = self.config.window_secs,
                "Rate limit exceeded"
            );
            return Err(AppError::TooManyRequests(format!(
                "limit is {} requests per {} seconds",
                self.config.max_requests, self.config.window_secs
            )));
        }

        timestamps.push(now);
        Ok(())
    }

    /// Drop clients whose entire window has expired.
    /// Returns how many clients were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let window = Duration::from_secs(self.config.window_secs);
        let before = self.clients.len();

        self.clients.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < window);
            !timestamps.is_empty()
        });

        before.saturating_sub(self.clients.len())
    }

    /// Number of clients currently holding window state
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

/// Spawn the periodic sweep task for a limiter.
/// Runs once per window for the life of the process.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>) {
    let period = Duration::from_secs(limiter.config.window_secs.max(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately; skip it
        interval.tick().await;

        loop {
            interval.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!(
                    removed = removed,
                    remaining = limiter.tracked_clients(),
                    "Rate limiter sweep completed"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(max_requests: usize, window_secs: u64) -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            max_requests,
            window_secs,
            exempt_paths: vec!["/health".to_string(), "/metrics".to_string()],
        }
    }

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(test_config(3, 60));
        let now = Instant::now();

        assert!(limiter.check_at("10.0.0.1", now).is_ok());
        assert!(limiter.check_at("10.0.0.1", now).is_ok());
        assert!(limiter.check_at("10.0.0.1", now).is_ok());

        let err = limiter.check_at("10.0.0.1", now).unwrap_err();
        assert_eq!(err.status_code().as_u16(), 429);
    }

    #[test]
    fn test_clients_are_counted_independently() {
        let limiter = RateLimiter::new(test_config(1, 60));
        let now = Instant::now();

        assert!(limiter.check_at("10.0.0.1", now).is_ok());
        assert!(limiter.check_at("10.0.0.1", now).is_err());
        assert!(limiter.check_at("10.0.0.2", now).is_ok());
    }

    #[test]
    fn test_window_elapse_readmits() {
        let limiter = RateLimiter::new(test_config(2, 60));
        let start = Instant::now();

        assert!(limiter.check_at("client", start).is_ok());
        assert!(limiter.check_at("client", start).is_ok());
        assert!(limiter.check_at("client", start).is_err());

        let later = start + Duration::from_secs(61);
        assert!(limiter.check_at("client", later).is_ok());
    }

    #[test]
    fn test_disabled_limiter_admits_everything() {
        let mut config = test_config(1, 60);
        config.enabled = false;
        let limiter = RateLimiter::new(config);
        let now = Instant::now();

        for _ in 0..10 {
            assert!(limiter.check_at("client", now).is_ok());
        }
    }

    #[test]
    fn test_exempt_paths() {
        let limiter = RateLimiter::new(test_config(1, 60));
        assert!(limiter.is_exempt("/health"));
        assert!(limiter.is_exempt("/metrics"));
        assert!(!limiter.is_exempt("/api/notes"));
    }

    #[test]
    fn test_sweep_removes_expired_clients() {
        let limiter = RateLimiter::new(test_config(5, 60));
        let start = Instant::now();

        limiter.check_at("a", start).unwrap();
        limiter.check_at("b", start).unwrap();
        assert_eq!(limiter.tracked_clients(), 2);

        let removed = limiter.sweep_at(start + Duration::from_secs(61));
        assert_eq!(removed, 2);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_sweep_keeps_live_clients() {
        let limiter = RateLimiter::new(test_config(5, 60));
        let start = Instant::now();

        limiter.check_at("idle", start).unwrap();
        limiter
            .check_at("fresh", start + Duration::from_secs(50))
            .unwrap();

        let removed = limiter.sweep_at(start + Duration::from_secs(70));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
