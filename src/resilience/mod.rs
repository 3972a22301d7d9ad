//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! IntegrationClient::make_request:
//!     → circuit_breaker.rs (fail fast when open, record the call outcome)
//!     → retries.rs (retry retryable kinds with backoff.rs delays)
//!     → timeouts.rs (per-attempt deadline around the transport call)
//!     → on failure: classifier.rs (kind, severity, alert decision)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every transport attempt has a deadline
//! - The breaker sees one outcome per call, after retries are spent
//! - Classification is a pure function of the failure

pub mod backoff;
pub mod circuit_breaker;
pub mod classifier;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{BreakerError, CircuitBreaker, CircuitBreakerStats, CircuitState};
pub use classifier::{classify, severity, should_alert, Classify, ErrorKind, Severity};
pub use retries::{RetryContext, RetryHandler};
