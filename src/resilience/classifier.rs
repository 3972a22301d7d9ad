//! Error classification.
//!
//! Every failure is mapped to one of six kinds. The kind drives retry
//! eligibility (`retries.rs`), severity and whether an operator is paged.
//!
//! Status codes take precedence over message text. Message matching is
//! case-insensitive and checked in a fixed order: timeout, connection,
//! authentication, rate limit. Anything else is a server error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transport::{TransportError, TransportResponse};

/// Closed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    ConnectionError,
    AuthenticationError,
    RateLimit,
    ServerError,
    ValidationError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::AuthenticationError => "authentication_error",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ServerError => "server_error",
            ErrorKind::ValidationError => "validation_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-facing urgency of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const TIMEOUT_TERMS: &[&str] = &["timeout", "timed out", "etimedout", "deadline exceeded"];
const CONNECTION_TERMS: &[&str] = &[
    "econnrefused",
    "econnreset",
    "enotfound",
    "connection",
    "network",
    "socket hang up",
    "dns",
];
const AUTH_TERMS: &[&str] = &[
    "unauthorized",
    "forbidden",
    "authentication",
    "invalid token",
    "invalid api key",
    "credential",
];
const RATE_LIMIT_TERMS: &[&str] = &["rate limit", "too many requests", "throttl"];

/// Map a failure status to a kind. Non-failure statuses yield `None`.
pub fn classify_status(status: u16) -> Option<ErrorKind> {
    match status {
        401 | 403 => Some(ErrorKind::AuthenticationError),
        429 => Some(ErrorKind::RateLimit),
        400..=499 => Some(ErrorKind::ValidationError),
        500..=599 => Some(ErrorKind::ServerError),
        _ => None,
    }
}

/// Classify a failure from its message and optional response.
pub fn classify(message: &str, response: Option<&TransportResponse>) -> ErrorKind {
    if let Some(kind) = response.and_then(|r| classify_status(r.status)) {
        return kind;
    }

    let message = message.to_lowercase();
    let matches = |terms: &[&str]| terms.iter().any(|term| message.contains(term));

    if matches(TIMEOUT_TERMS) {
        ErrorKind::Timeout
    } else if matches(CONNECTION_TERMS) {
        ErrorKind::ConnectionError
    } else if matches(AUTH_TERMS) {
        ErrorKind::AuthenticationError
    } else if matches(RATE_LIMIT_TERMS) {
        ErrorKind::RateLimit
    } else {
        ErrorKind::ServerError
    }
}

pub fn severity(kind: ErrorKind) -> Severity {
    match kind {
        ErrorKind::AuthenticationError => Severity::Critical,
        ErrorKind::ServerError => Severity::High,
        ErrorKind::Timeout | ErrorKind::ConnectionError | ErrorKind::RateLimit => Severity::Medium,
        ErrorKind::ValidationError => Severity::Low,
    }
}

/// Whether a failure, after `retry_count` retries, should page someone.
pub fn should_alert(kind: ErrorKind, retry_count: u32) -> bool {
    match kind {
        ErrorKind::AuthenticationError => true,
        ErrorKind::ServerError => retry_count >= 1,
        ErrorKind::Timeout | ErrorKind::ConnectionError => retry_count >= 3,
        ErrorKind::RateLimit | ErrorKind::ValidationError => false,
    }
}

/// Errors that can be placed in the taxonomy.
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for TransportError {
    fn kind(&self) -> ErrorKind {
        match self {
            // A request we could not even build will not get better on retry.
            TransportError::InvalidRequest(_) => ErrorKind::ValidationError,
            _ => classify(&self.to_string(), self.response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> TransportResponse {
        TransportResponse::new(status, "")
    }

    #[test]
    fn test_status_precedence() {
        // Message says timeout, status wins.
        assert_eq!(classify("timeout", Some(&response(401))), ErrorKind::AuthenticationError);
        assert_eq!(classify("", Some(&response(403))), ErrorKind::AuthenticationError);
        assert_eq!(classify("", Some(&response(429))), ErrorKind::RateLimit);
        assert_eq!(classify("", Some(&response(404))), ErrorKind::ValidationError);
        assert_eq!(classify("", Some(&response(422))), ErrorKind::ValidationError);
        assert_eq!(classify("", Some(&response(500))), ErrorKind::ServerError);
        assert_eq!(classify("", Some(&response(503))), ErrorKind::ServerError);
    }

    #[test]
    fn test_non_failure_status_falls_back_to_message() {
        assert_eq!(classify("Network unreachable", Some(&response(302))), ErrorKind::ConnectionError);
    }

    #[test]
    fn test_message_patterns() {
        assert_eq!(classify("Request TIMED OUT", None), ErrorKind::Timeout);
        assert_eq!(classify("connect ECONNREFUSED 127.0.0.1:80", None), ErrorKind::ConnectionError);
        assert_eq!(classify("Unauthorized: bad key", None), ErrorKind::AuthenticationError);
        assert_eq!(classify("Rate limit exceeded", None), ErrorKind::RateLimit);
        assert_eq!(classify("something odd happened", None), ErrorKind::ServerError);
    }

    #[test]
    fn test_timeout_checked_before_connection() {
        assert_eq!(classify("connection timeout", None), ErrorKind::Timeout);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let resp = response(418);
        let first = classify("socket hang up", Some(&resp));
        for _ in 0..100 {
            assert_eq!(classify("socket hang up", Some(&resp)), first);
        }
    }

    #[test]
    fn test_transport_error_kinds() {
        assert_eq!(TransportError::Timeout { after_ms: 10 }.kind(), ErrorKind::Timeout);
        assert_eq!(
            TransportError::Connection("reset by peer".into()).kind(),
            ErrorKind::ConnectionError
        );
        assert_eq!(
            TransportError::Credential("provider down".into()).kind(),
            ErrorKind::AuthenticationError
        );
        assert_eq!(
            TransportError::Response(response(500)).kind(),
            ErrorKind::ServerError
        );
        assert_eq!(
            TransportError::InvalidRequest("bad path".into()).kind(),
            ErrorKind::ValidationError
        );
    }

    #[test]
    fn test_severity() {
        assert_eq!(severity(ErrorKind::AuthenticationError), Severity::Critical);
        assert_eq!(severity(ErrorKind::ServerError), Severity::High);
        assert_eq!(severity(ErrorKind::Timeout), Severity::Medium);
        assert_eq!(severity(ErrorKind::ConnectionError), Severity::Medium);
        assert_eq!(severity(ErrorKind::RateLimit), Severity::Medium);
        assert_eq!(severity(ErrorKind::ValidationError), Severity::Low);
    }

    #[test]
    fn test_should_alert() {
        assert!(should_alert(ErrorKind::AuthenticationError, 0));
        assert!(!should_alert(ErrorKind::ServerError, 0));
        assert!(should_alert(ErrorKind::ServerError, 1));
        assert!(!should_alert(ErrorKind::Timeout, 2));
        assert!(should_alert(ErrorKind::Timeout, 3));
        assert!(should_alert(ErrorKind::ConnectionError, 5));
        for n in 0..20 {
            assert!(!should_alert(ErrorKind::ValidationError, n));
            assert!(!should_alert(ErrorKind::RateLimit, n));
        }
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ErrorKind::ConnectionError).unwrap();
        assert_eq!(json, "\"connection_error\"");
        assert_eq!(ErrorKind::RateLimit.to_string(), "rate_limit");
    }
}
