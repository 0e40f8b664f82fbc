// ============================================================================
// API Gateway
// ============================================================================
//
// The gateway is the single entry point for the microservices deployment.
// It handles:
// - Rate limiting (IP-based, fixed window)
// - Request forwarding to notes-service and folders-service
// - Upstream health aggregation
// - Gateway-side Prometheus metrics
//
// Architecture:
// - Stateless apart from the in-memory rate limiter (scales horizontally
//   when each instance enforces its own window)
// - No database connection and no JWT handling: the services authenticate
//   every forwarded request themselves
//
// ============================================================================

pub mod discovery;
pub mod router;
pub mod service_client;

pub use discovery::{ServiceDiscovery, StaticServiceDiscovery};
pub use router::{create_gateway_router, GatewayState};
pub use service_client::ServiceClient;
