//! Integration subsystem.
//!
//! # Data Flow
//! ```text
//! IntegrationManager (registry, factory)
//!     → IntegrationClient::make_request
//!         → CircuitBreaker::execute
//!             → RetryHandler::execute
//!                 → with_deadline(Transport::execute_request)
//!     → IntegrationResult (data or classified IntegrationError)
//! ```
//!
//! # Design Decisions
//! - One client, breaker and error log per endpoint
//! - Failures are values: callers inspect `IntegrationResult`, nothing throws

pub mod client;
pub mod error_log;
pub mod manager;
pub mod types;

pub use client::IntegrationClient;
pub use error_log::ErrorLog;
pub use manager::IntegrationManager;
pub use types::{ConfigurationError, IntegrationError, IntegrationResult};
