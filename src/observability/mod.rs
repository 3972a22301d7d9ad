//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers and clients produce:
//!     → events.rs (typed events for dashboards/alerting subscribers)
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Event subscribers (broadcast receivers)
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - No global event bus: every client owns its channel, the manager
//!   receives forwarded copies
//! - Request ID flows through logs, events and transport headers

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{EventSink, IntegrationEvent};
