//! Per-endpoint health snapshot.

use serde::Serialize;

use crate::config::ServiceType;
use crate::integration::IntegrationClient;
use crate::resilience::circuit_breaker::{CircuitBreakerStats, CircuitState};

/// How many of the latest logged errors count as "recent".
pub const HEALTH_ERROR_WINDOW: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct EndpointHealth {
    pub endpoint_id: String,
    pub name: String,
    pub service_type: ServiceType,
    pub circuit_breaker: CircuitBreakerStats,
    /// Logged errors within the last `HEALTH_ERROR_WINDOW` entries.
    pub recent_errors: usize,
    /// Milliseconds since the Unix epoch.
    pub last_error_at: Option<u64>,
    pub healthy: bool,
}

impl EndpointHealth {
    pub fn from_client(client: &IntegrationClient) -> Self {
        let endpoint = client.endpoint();
        let circuit_breaker = client.circuit_breaker_stats();
        let recent = client.recent_errors(HEALTH_ERROR_WINDOW);

        Self {
            endpoint_id: endpoint.id.clone(),
            name: endpoint.name.clone(),
            service_type: endpoint.service_type,
            healthy: circuit_breaker.state == CircuitState::Closed,
            circuit_breaker,
            recent_errors: recent.len(),
            last_error_at: recent.first().map(|e| e.timestamp),
        }
    }
}
