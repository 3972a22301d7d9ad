//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! IntegrationClient::make_request
//!     → resilience (breaker, retries, deadline)
//!     → Transport::execute_request (one attempt)
//!     → TransportResponse or TransportError
//! ```
//!
//! # Design Decisions
//! - Transports perform exactly one attempt; retry and breaker live above them
//! - Service-specific transports are supplied by the application through the
//!   `Transport` trait; `http.rs` covers the built-in service types
//! - Credentials are resolved per call, never cached here

pub mod credentials;
pub mod http;
pub mod types;

use futures_util::future::BoxFuture;

pub use credentials::{CredentialProvider, Credentials, StaticCredential};
pub use http::{AuthScheme, HttpTransport};
pub use types::{HttpMethod, IntegrationRequest, TransportError, TransportResponse};

/// The single capability a concrete integration must provide.
///
/// Implementations perform one call and report network failures as
/// `TransportError::Connection`. Failure statuses should be returned as
/// responses. The caller enforces the endpoint's deadline by dropping the
/// returned future, so implementations must be cancel-safe.
pub trait Transport: Send + Sync + 'static {
    fn execute_request<'a>(
        &'a self,
        request: &'a IntegrationRequest,
        request_id: &'a str,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>>;
}
