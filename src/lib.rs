//! Resilient integration layer for external HTTP services.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller
//!     │  IntegrationManager::create_client / get_client
//!     ▼
//!   ┌──────────────────────── IntegrationClient ────────────────────────┐
//!   │  CircuitBreaker ──▶ RetryHandler ──▶ deadline ──▶ Transport        │
//!   │        │                 │                          │              │
//!   │        ▼                 ▼                          ▼              │
//!   │   state events     backoff + jitter       TransportResponse/Error  │
//!   └───────────────────────────┬────────────────────────────────────────┘
//!                               ▼
//!        classifier → ErrorLog → IntegrationError / IntegrationAlert events
//!                               ▼
//!                      IntegrationResult (never throws)
//! ```

// Core subsystems
pub mod config;
pub mod integration;
pub mod transport;

// Cross-cutting concerns
pub mod health;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::IntegrationConfig;
pub use integration::{
    ConfigurationError, IntegrationClient, IntegrationError, IntegrationManager, IntegrationResult,
};
pub use observability::IntegrationEvent;
pub use transport::{Credentials, IntegrationRequest, Transport, TransportError, TransportResponse};
