//! Metrics collection and exposition.
//!
//! # Metrics
//! - `integration_requests_total` (counter): calls by endpoint, outcome
//! - `integration_request_duration_seconds` (histogram): total call latency
//! - `integration_request_attempts` (histogram): transport attempts per call
//! - `integration_errors_total` (counter): failed calls by endpoint, kind
//! - `integration_alerts_total` (counter): alerts by endpoint, severity
//! - `integration_retries_total` (counter): scheduled retries by endpoint, kind
//! - `integration_circuit_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::resilience::circuit_breaker::CircuitState;
use crate::resilience::classifier::{ErrorKind, Severity};

/// Install the Prometheus recorder with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: &str, success: bool, attempts: u32, elapsed: Duration) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "integration_requests_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "integration_request_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(elapsed.as_secs_f64());
    histogram!(
        "integration_request_attempts",
        "endpoint" => endpoint.to_string()
    )
    .record(f64::from(attempts));
}

pub fn record_integration_error(endpoint: &str, kind: ErrorKind) {
    counter!(
        "integration_errors_total",
        "endpoint" => endpoint.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

pub fn record_alert(endpoint: &str, severity: Severity) {
    counter!(
        "integration_alerts_total",
        "endpoint" => endpoint.to_string(),
        "severity" => severity.as_str()
    )
    .increment(1);
}

pub fn record_retry(endpoint: &str, kind: ErrorKind) {
    counter!(
        "integration_retries_total",
        "endpoint" => endpoint.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

pub fn record_circuit_state(endpoint: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!("integration_circuit_state", "endpoint" => endpoint.to_string()).set(value);
}
