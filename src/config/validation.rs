//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check endpoint id uniqueness
//! - Validate value ranges (timeouts > 0, multiplier > 1, thresholds >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: IntegrationConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::{EndpointConfig, IntegrationConfig};

/// A single semantic violation in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("endpoint #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate endpoint id '{0}'")]
    DuplicateId(String),

    #[error("endpoint '{id}': invalid base_url '{url}'")]
    InvalidBaseUrl { id: String, url: String },

    #[error("endpoint '{id}': {field} must be {requirement}")]
    OutOfRange {
        id: String,
        field: &'static str,
        requirement: &'static str,
    },
}

/// Validate a whole configuration.
pub fn validate_config(config: &IntegrationConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, endpoint) in config.endpoints.iter().enumerate() {
        if endpoint.id.trim().is_empty() {
            errors.push(ValidationError::EmptyId { index });
        } else if !seen.insert(endpoint.id.as_str()) {
            errors.push(ValidationError::DuplicateId(endpoint.id.clone()));
        }
        errors.extend(validate_endpoint(endpoint));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Range and format checks for a single endpoint.
pub fn validate_endpoint(endpoint: &EndpointConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let out_of_range = |field, requirement| ValidationError::OutOfRange {
        id: endpoint.id.clone(),
        field,
        requirement,
    };

    if Url::parse(&endpoint.base_url).is_err() {
        errors.push(ValidationError::InvalidBaseUrl {
            id: endpoint.id.clone(),
            url: endpoint.base_url.clone(),
        });
    }
    if endpoint.timeout_ms == 0 {
        errors.push(out_of_range("timeout_ms", "greater than 0"));
    }

    let retry = &endpoint.retry;
    if retry.max_attempts < 1 {
        errors.push(out_of_range("retry.max_attempts", "at least 1"));
    }
    if retry.backoff_multiplier.is_nan() || retry.backoff_multiplier <= 1.0 {
        errors.push(out_of_range("retry.backoff_multiplier", "greater than 1"));
    }
    if retry.max_delay_ms < retry.base_delay_ms {
        errors.push(out_of_range(
            "retry.max_delay_ms",
            "greater than or equal to retry.base_delay_ms",
        ));
    }

    let breaker = &endpoint.circuit_breaker;
    if breaker.failure_threshold < 1 {
        errors.push(out_of_range("circuit_breaker.failure_threshold", "at least 1"));
    }
    if breaker.reset_timeout_ms == 0 {
        errors.push(out_of_range("circuit_breaker.reset_timeout_ms", "greater than 0"));
    }

    errors
}
