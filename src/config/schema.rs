//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! integration layer. All types derive Serde traits for deserialization from
//! config files. Durations are expressed in milliseconds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Root configuration for the integration layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Endpoint definitions, one per external service.
    pub endpoints: Vec<EndpointConfig>,
}

/// Closed set of external service types the manager knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// CRM API, bearer-token authenticated.
    Crm,
    /// Photo-management API, API-key authenticated.
    PhotoManagement,
    /// Plain REST API, optional bearer token.
    Rest,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceType::Crm => "crm",
            ServiceType::PhotoManagement => "photo_management",
            ServiceType::Rest => "rest",
        };
        f.write_str(name)
    }
}

/// A named, configured destination with its own breaker/retry policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Unique endpoint identifier.
    pub id: String,

    /// Display name for dashboards and logs.
    pub name: String,

    /// Which concrete client variant to construct.
    pub service_type: ServiceType,

    /// Base address (e.g., "https://api.example.com/v2").
    pub base_url: String,

    /// Per-attempt deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry policy.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Circuit breaker policy.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl EndpointConfig {
    /// Create an endpoint with default retry and breaker policies.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        service_type: ServiceType,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            service_type,
            base_url: base_url.into(),
            timeout_ms: default_timeout_ms(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }

    /// Per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Hard cap on attempts per call (1 disables retries).
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds.
    pub max_delay_ms: u64,

    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,

    /// Perturb each delay by up to ±25%.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no backoff.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// When false the breaker is a passthrough.
    pub enabled: bool,

    /// Failure count that trips the breaker open.
    pub failure_threshold: u32,

    /// Minimum time open before a half-open probe, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Accepted for compatibility with existing endpoint definitions.
    /// Failure counting is cumulative since the last close or reset and does
    /// not read this value.
    pub monitoring_window_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            reset_timeout_ms: 60_000,
            monitoring_window_ms: 300_000,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
