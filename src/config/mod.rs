//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → IntegrationConfig (validated, immutable)
//!     → IntegrationManager::from_config registers every endpoint
//! ```
//!
//! # Design Decisions
//! - Endpoint config is immutable once registered; clients hold it by Arc
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CircuitBreakerConfig, EndpointConfig, IntegrationConfig, ObservabilityConfig, RetryConfig,
    ServiceType,
};
