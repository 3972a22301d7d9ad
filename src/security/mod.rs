//! Security subsystem.
//!
//! # Responsibilities
//! - Keep credentials out of stored error records, events and logs
//!
//! # Design Decisions
//! - Credentials are injected by the transport at call time, so the request a
//!   caller builds normally holds none; redaction still covers caller-supplied
//!   auth headers

pub mod headers;

pub use headers::{redact_headers, sanitize_request, sanitize_response, REDACTED};
