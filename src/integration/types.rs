//! Result contract and error records of the integration layer.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ServiceType;
use crate::resilience::classifier::{ErrorKind, Severity};
use crate::transport::{IntegrationRequest, TransportError, TransportResponse};

/// Structured record of a failed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationError {
    /// Request id of the failed call.
    pub id: String,
    pub endpoint_id: String,
    pub kind: ErrorKind,
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    /// Request with credential-bearing headers redacted.
    pub request: IntegrationRequest,
    pub response: Option<TransportResponse>,
    /// Retries performed before giving up.
    pub retry_count: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub resolved: bool,
}

/// Outcome of `IntegrationClient::make_request`. Never a panic or `Err` at
/// the call site: failures are carried in `outcome`.
#[derive(Debug, Clone)]
pub struct IntegrationResult<T = TransportResponse> {
    pub outcome: Result<T, IntegrationError>,
    /// Transport invocations made (0 when the breaker rejected the call).
    pub attempts: u32,
    pub elapsed: Duration,
}

impl<T> IntegrationResult<T> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn data(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&IntegrationError> {
        self.outcome.as_ref().err()
    }

    pub fn into_result(self) -> Result<T, IntegrationError> {
        self.outcome
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> IntegrationResult<U> {
        IntegrationResult {
            outcome: self.outcome.map(f),
            attempts: self.attempts,
            elapsed: self.elapsed,
        }
    }
}

/// Errors raised while building clients.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("endpoint '{0}' is not registered")]
    UnknownEndpoint(String),

    #[error("endpoint '{endpoint_id}' ({service_type}) requires credentials")]
    MissingCredentials {
        endpoint_id: String,
        service_type: ServiceType,
    },

    #[error("endpoint '{endpoint_id}': failed to build transport: {source}")]
    Transport {
        endpoint_id: String,
        #[source]
        source: TransportError,
    },
}
