//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! IntegrationManager::get_health_status
//!     → status.rs (one snapshot per registered client)
//!     → breaker stats + error log summary
//!     → healthy iff breaker CLOSED
//! ```
//!
//! # Design Decisions
//! - Snapshots are computed on demand, nothing is probed in the background
//! - Health follows the breaker only; logged errors are reported, not judged

pub mod status;

pub use status::{EndpointHealth, HEALTH_ERROR_WINDOW};
