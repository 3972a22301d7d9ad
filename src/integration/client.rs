//! Per-endpoint integration client.
//!
//! # Responsibilities
//! - Compose circuit breaker, retry handler and deadline around a transport
//! - Convert every failure into a classified, redacted `IntegrationError`
//! - Keep the error log and publish error/alert events
//!
//! # Design Decisions
//! - `make_request` never returns `Err` or panics; failures travel in the result
//! - The breaker wraps the whole retry loop, so it records one outcome per call
//! - Dropping the `make_request` future cancels the in-flight attempt and any
//!   pending backoff sleep

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::EndpointConfig;
use crate::integration::error_log::ErrorLog;
use crate::integration::types::{IntegrationError, IntegrationResult};
use crate::observability::events::{EventSink, IntegrationEvent};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{epoch_millis, BreakerError, CircuitBreaker, CircuitBreakerStats};
use crate::resilience::classifier::{severity, should_alert, Classify};
use crate::resilience::retries::{RetryContext, RetryHandler};
use crate::resilience::timeouts::with_deadline;
use crate::security::{sanitize_request, sanitize_response};
use crate::transport::{IntegrationRequest, Transport, TransportError, TransportResponse};

/// A resilient client bound to one endpoint.
pub struct IntegrationClient {
    endpoint: Arc<EndpointConfig>,
    transport: Arc<dyn Transport>,
    breaker: CircuitBreaker,
    retry: RetryHandler,
    errors: ErrorLog,
    events: EventSink,
}

impl IntegrationClient {
    /// Create a standalone client with its own event channel.
    pub fn new(endpoint: Arc<EndpointConfig>, transport: Arc<dyn Transport>) -> Self {
        Self::with_events(endpoint, transport, EventSink::new())
    }

    /// Create a client publishing into `events`.
    pub fn with_events(
        endpoint: Arc<EndpointConfig>,
        transport: Arc<dyn Transport>,
        events: EventSink,
    ) -> Self {
        let breaker = CircuitBreaker::new(
            endpoint.id.clone(),
            endpoint.circuit_breaker.clone(),
            events.clone(),
        );
        let retry = RetryHandler::new(endpoint.retry.clone());

        Self {
            endpoint,
            transport,
            breaker,
            retry,
            errors: ErrorLog::new(),
            events,
        }
    }

    pub fn id(&self) -> &str {
        &self.endpoint.id
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Events of this client only.
    pub fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        self.events.subscribe()
    }

    /// Perform a call through breaker, retries and deadline.
    pub async fn make_request(&self, request: IntegrationRequest) -> IntegrationResult {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let attempts = AtomicU32::new(0);
        let ctx = RetryContext {
            endpoint_id: &self.endpoint.id,
            request_id: &request_id,
        };

        tracing::debug!(
            endpoint = %self.endpoint.id,
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            "Making integration request"
        );

        let retry = &self.retry;
        let (req, id, counter) = (&request, request_id.as_str(), &attempts);
        let outcome = self
            .breaker
            .execute(move || retry.execute(ctx, move || self.attempt(req, id, counter)))
            .await;

        let attempts = attempts.load(Ordering::Relaxed);
        let elapsed = started.elapsed();
        metrics::record_request(&self.endpoint.id, outcome.is_ok(), attempts, elapsed);

        let outcome = match outcome {
            Ok(response) => {
                tracing::debug!(
                    endpoint = %self.endpoint.id,
                    request_id = %request_id,
                    status = response.status,
                    attempts,
                    elapsed = ?elapsed,
                    "Integration request succeeded"
                );
                Ok(response)
            }
            Err(err) => Err(self.handle_failure(&request_id, &request, err, attempts)),
        };

        IntegrationResult {
            outcome,
            attempts,
            elapsed,
        }
    }

    /// One transport attempt under a fresh deadline.
    async fn attempt(
        &self,
        request: &IntegrationRequest,
        request_id: &str,
        attempts: &AtomicU32,
    ) -> Result<TransportResponse, TransportError> {
        attempts.fetch_add(1, Ordering::Relaxed);
        let call = self.transport.execute_request(request, request_id);
        let response = with_deadline(self.endpoint.timeout(), call).await?;

        if response.is_failure() {
            return Err(TransportError::Response(response));
        }
        Ok(response)
    }

    /// Classify, record and publish a failed call.
    fn handle_failure(
        &self,
        request_id: &str,
        request: &IntegrationRequest,
        err: BreakerError<TransportError>,
        attempts: u32,
    ) -> IntegrationError {
        let kind = err.kind();
        let severity = severity(kind);
        let retry_count = attempts.saturating_sub(1);
        let (code, response) = match &err {
            BreakerError::Open { .. } => (Some("CIRCUIT_OPEN".to_string()), None),
            BreakerError::Inner(e) => (e.code(), e.response().map(sanitize_response)),
        };

        let error = IntegrationError {
            id: request_id.to_string(),
            endpoint_id: self.endpoint.id.clone(),
            kind,
            severity,
            code,
            message: err.to_string(),
            request: sanitize_request(request),
            response,
            retry_count,
            timestamp: epoch_millis(),
            resolved: false,
        };

        tracing::warn!(
            endpoint = %self.endpoint.id,
            request_id = %request_id,
            kind = %kind,
            severity = %severity,
            attempts,
            error = %error.message,
            "Integration request failed"
        );
        metrics::record_integration_error(&self.endpoint.id, kind);

        self.errors.record(error.clone());
        self.events.emit(IntegrationEvent::IntegrationError {
            error: error.clone(),
        });

        if should_alert(kind, retry_count) {
            tracing::error!(
                endpoint = %self.endpoint.id,
                request_id = %request_id,
                kind = %kind,
                severity = %severity,
                retry_count,
                "Integration alert"
            );
            metrics::record_alert(&self.endpoint.id, severity);
            self.events.emit(IntegrationEvent::IntegrationAlert {
                error: error.clone(),
                severity,
            });
        }

        error
    }

    pub fn circuit_breaker_stats(&self) -> CircuitBreakerStats {
        self.breaker.stats()
    }

    /// Up to `limit` logged errors, most recent first.
    pub fn recent_errors(&self, limit: usize) -> Vec<IntegrationError> {
        self.errors.recent(limit)
    }

    pub fn last_error(&self) -> Option<IntegrationError> {
        self.errors.latest()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Mark a logged error as handled.
    pub fn resolve_error(&self, id: &str) -> bool {
        self.errors.resolve(id)
    }

    pub fn reset_circuit_breaker(&self) {
        self.breaker.reset();
    }

    pub fn clear_error_log(&self) {
        self.errors.clear();
        tracing::info!(endpoint = %self.endpoint.id, "Error log cleared");
    }
}

impl fmt::Debug for IntegrationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationClient")
            .field("endpoint", &self.endpoint.id)
            .field("service_type", &self.endpoint.service_type)
            .field("state", &self.breaker.state())
            .field("errors", &self.errors.len())
            .finish()
    }
}
