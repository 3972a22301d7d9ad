//! Credential redaction for stored request/response snapshots.
//!
//! # Design Decisions
//! - Redaction happens before an error record is stored or emitted
//! - Matching is case-insensitive on header names and query keys
//! - Values are replaced, names are kept so operators can see what was sent

use std::collections::BTreeMap;

use crate::transport::{IntegrationRequest, TransportResponse};

pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_NAMES: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "api-key",
    "x-api-key",
    "apikey",
    "api_key",
    "x-auth-token",
    "access_token",
];

const SENSITIVE_FRAGMENTS: &[&str] = &["token", "secret", "password"];

/// Whether a header name or query key carries a credential.
pub fn is_sensitive(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_NAMES.contains(&name.as_str())
        || SENSITIVE_FRAGMENTS.iter().any(|fragment| name.contains(fragment))
}

pub fn redact_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if is_sensitive(name) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}

/// Copy of a request that is safe to log and keep.
pub fn sanitize_request(request: &IntegrationRequest) -> IntegrationRequest {
    IntegrationRequest {
        method: request.method,
        path: request.path.clone(),
        headers: redact_headers(&request.headers),
        query: request
            .query
            .iter()
            .map(|(key, value)| {
                let value = if is_sensitive(key) {
                    REDACTED.to_string()
                } else {
                    value.clone()
                };
                (key.clone(), value)
            })
            .collect(),
        body: request.body.clone(),
    }
}

pub fn sanitize_response(response: &TransportResponse) -> TransportResponse {
    TransportResponse {
        status: response.status,
        headers: redact_headers(&response.headers),
        body: response.body.clone(),
    }
}
