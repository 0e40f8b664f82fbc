// ============================================================================
// Service Discovery
// ============================================================================
//
// Maps logical service names to base URLs. Only static URLs from
// configuration are supported; each upstream has a fixed address in the
// compose network.
//
// ============================================================================

use anyhow::Result;
use notehub_config::GatewayConfig;
use std::sync::Arc;

/// Names of every upstream the gateway can route to
pub const SERVICE_NAMES: &[&str] = &["notes-service", "folders-service"];

/// Service discovery abstraction
pub trait ServiceDiscovery: Send + Sync {
    /// Get the base URL for a given service name
    fn get_service_url(&self, service_name: &str) -> Result<String>;

    /// Names of the services this discovery knows about
    fn service_names(&self) -> &'static [&'static str] {
        SERVICE_NAMES
    }
}

/// Static service discovery (from config)
pub struct StaticServiceDiscovery {
    config: Arc<GatewayConfig>,
}

impl StaticServiceDiscovery {
    pub fn new(config: Arc<GatewayConfig>) -> Self {
        Self { config }
    }
}

impl ServiceDiscovery for StaticServiceDiscovery {
    fn get_service_url(&self, service_name: &str) -> Result<String> {
        match service_name {
            "notes-service" => Ok(self.config.notes_service_url.clone()),
            "folders-service" => Ok(self.config.folders_service_url.clone()),
            _ => anyhow::bail!("Unknown service: {}", service_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Arc<GatewayConfig> {
        Arc::new(GatewayConfig {
            notes_service_url: "http://127.0.0.1:8001".to_string(),
            folders_service_url: "http://127.0.0.1:8002".to_string(),
            timeout_secs: 30,
            health_probe_timeout_secs: 5,
        })
    }

    #[test]
    fn test_resolves_known_services() {
        let discovery = StaticServiceDiscovery::new(test_config());
        assert_eq!(
            discovery.get_service_url("notes-service").unwrap(),
            "http://127.0.0.1:8001"
        );
        assert_eq!(
            discovery.get_service_url("folders-service").unwrap(),
            "http://127.0.0.1:8002"
        );
    }

    #[test]
    fn test_rejects_unknown_service() {
        let discovery = StaticServiceDiscovery::new(test_config());
        assert!(discovery.get_service_url("billing-service").is_err());
    }

    #[test]
    fn test_service_names_cover_both_upstreams() {
        let discovery = StaticServiceDiscovery::new(test_config());
        assert_eq!(
            discovery.service_names(),
            &["notes-service", "folders-service"]
        );
    }
}
