//! Circuit breaker for endpoint protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: endpoint assumed down, requests fail fast
//! - Half-Open: testing if endpoint recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold
//! Open → Half-Open: next call after reset timeout
//! Half-Open → Closed: 3 consecutive successes
//! Half-Open → Open: any failure
//! ```
//!
//! # Design Decisions
//! - Per-endpoint circuit breaker (not global)
//! - Fail fast in Open state (the operation is never invoked)
//! - Single trial call in Half-Open; concurrent callers are rejected until it
//!   reports or is dropped
//! - Outcomes are tagged with the state generation that admitted them, so a
//!   slow call from an earlier state cannot close the circuit
//! - Failures are counted cumulatively until the breaker closes or is reset
//! - State lives behind a mutex that is never held across the operation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::events::{EventSink, IntegrationEvent};
use crate::observability::metrics;
use crate::resilience::classifier::{classify, Classify, ErrorKind};

/// Consecutive half-open successes required to close the circuit.
pub const HALF_OPEN_SUCCESS_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        };
        f.write_str(name)
    }
}

/// Read-only snapshot for observability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failures: u32,
    pub successes: u32,
    /// Milliseconds since the Unix epoch.
    pub last_failure_time: Option<u64>,
}

/// Outcome of a guarded call that did not succeed.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker rejected the call without running it.
    #[error("circuit breaker is open, next attempt allowed in {retry_in_ms}ms")]
    Open { retry_in_ms: u64 },

    /// The operation ran and failed.
    #[error("{0}")]
    Inner(E),
}

impl<E: Classify + fmt::Display> Classify for BreakerError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            BreakerError::Open { .. } => classify(&self.to_string(), None),
            BreakerError::Inner(e) => e.kind(),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    successes: u32,
    last_failure: Option<Instant>,
    last_failure_at: Option<u64>,
    /// Bumped on every state change; outcomes of calls admitted under an
    /// older generation do not count as half-open successes.
    generation: u64,
    /// A half-open trial call is running.
    trial_in_flight: bool,
}

impl BreakerState {
    fn enter(&mut self, state: CircuitState) {
        self.state = state;
        self.successes = 0;
        self.generation += 1;
        self.trial_in_flight = false;
    }
}

/// Admission ticket for one call. Releases the half-open trial slot if the
/// call is dropped before it reports an outcome.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    settled: bool,
}

impl Permit<'_> {
    fn succeed(mut self) {
        self.settled = true;
        self.breaker.on_success(self.generation, self.trial);
    }

    fn fail(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.generation, self.trial);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.settled {
            let mut inner = self.breaker.lock();
            if inner.generation == self.generation {
                inner.trial_in_flight = false;
            }
        }
    }
}

/// Per-endpoint circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    endpoint_id: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
    events: EventSink,
}

impl CircuitBreaker {
    pub fn new(endpoint_id: impl Into<String>, config: CircuitBreakerConfig, events: EventSink) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            config,
            inner: Mutex::new(BreakerState::default()),
            events,
        }
    }

    /// Run `operation` if the breaker permits it and record the outcome.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.config.enabled {
            return operation().await.map_err(BreakerError::Inner);
        }

        let permit = match self.try_acquire() {
            Ok(permit) => permit,
            Err(wait) => {
                tracing::debug!(
                    endpoint = %self.endpoint_id,
                    retry_in = ?wait,
                    "Circuit open, rejecting call"
                );
                return Err(BreakerError::Open {
                    retry_in_ms: wait.as_millis() as u64,
                });
            }
        };

        match operation().await {
            Ok(value) => {
                permit.succeed();
                Ok(value)
            }
            Err(err) => {
                permit.fail();
                Err(BreakerError::Inner(err))
            }
        }
    }

    /// Force the breaker closed and zero all counters.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            let generation = inner.generation + 1;
            *inner = BreakerState {
                generation,
                ..BreakerState::default()
            };
        }
        tracing::info!(endpoint = %self.endpoint_id, "Circuit breaker reset");
        metrics::record_circuit_state(&self.endpoint_id, CircuitState::Closed);
        self.events.emit(IntegrationEvent::Reset {
            endpoint_id: self.endpoint_id.clone(),
        });
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.lock();
        CircuitBreakerStats {
            state: inner.state,
            failures: inner.failures,
            successes: inner.successes,
            last_failure_time: inner.last_failure_at,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Admit a call, moving Open → Half-Open once the reset timeout elapsed.
    /// Half-Open admits one trial at a time. On rejection returns the
    /// remaining wait (zero while a trial is running).
    fn try_acquire(&self) -> Result<Permit<'_>, Duration> {
        let generation = {
            let mut inner = self.lock();
            match inner.state {
                CircuitState::Closed => {
                    return Ok(self.permit(inner.generation, false));
                }
                CircuitState::HalfOpen => {
                    if inner.trial_in_flight {
                        return Err(Duration::ZERO);
                    }
                    inner.trial_in_flight = true;
                    return Ok(self.permit(inner.generation, true));
                }
                CircuitState::Open => {}
            }

            let reset_timeout = self.config.reset_timeout();
            let elapsed = inner
                .last_failure
                .map(|at| at.elapsed())
                .unwrap_or(reset_timeout);
            if elapsed < reset_timeout {
                return Err(reset_timeout - elapsed);
            }

            inner.enter(CircuitState::HalfOpen);
            inner.trial_in_flight = true;
            inner.generation
        };

        self.transition(CircuitState::Open, CircuitState::HalfOpen);
        Ok(self.permit(generation, true))
    }

    fn permit(&self, generation: u64, trial: bool) -> Permit<'_> {
        Permit {
            breaker: self,
            generation,
            trial,
            settled: false,
        }
    }

    fn on_success(&self, generation: u64, trial: bool) {
        let closed = {
            let mut inner = self.lock();
            if inner.generation != generation || inner.state != CircuitState::HalfOpen {
                return;
            }
            if trial {
                inner.trial_in_flight = false;
            }
            inner.successes += 1;
            if inner.successes >= HALF_OPEN_SUCCESS_THRESHOLD {
                let generation = inner.generation + 1;
                *inner = BreakerState {
                    generation,
                    ..BreakerState::default()
                };
                true
            } else {
                false
            }
        };

        if closed {
            self.transition(CircuitState::HalfOpen, CircuitState::Closed);
        }
    }

    /// Failures count in every state, whatever generation admitted them.
    fn on_failure(&self, generation: u64, trial: bool) {
        let (opened_from, failures) = {
            let mut inner = self.lock();
            if trial && inner.generation == generation {
                inner.trial_in_flight = false;
            }
            inner.failures = inner.failures.saturating_add(1);
            inner.successes = 0;
            inner.last_failure = Some(Instant::now());
            inner.last_failure_at = Some(epoch_millis());

            let previous = inner.state;
            if inner.failures >= self.config.failure_threshold && previous != CircuitState::Open {
                inner.enter(CircuitState::Open);
                (Some(previous), inner.failures)
            } else {
                (None, inner.failures)
            }
        };

        if let Some(previous) = opened_from {
            self.transition(previous, CircuitState::Open);
            tracing::warn!(
                endpoint = %self.endpoint_id,
                failures,
                reset_timeout_ms = self.config.reset_timeout_ms,
                "Circuit breaker opened"
            );
            self.events.emit(IntegrationEvent::CircuitOpen {
                endpoint_id: self.endpoint_id.clone(),
                failures,
            });
        }
    }

    fn transition(&self, from: CircuitState, to: CircuitState) {
        tracing::info!(
            endpoint = %self.endpoint_id,
            from = %from,
            to = %to,
            "Circuit breaker state change"
        );
        metrics::record_circuit_state(&self.endpoint_id, to);
        self.events.emit(IntegrationEvent::StateChange {
            endpoint_id: self.endpoint_id.clone(),
            from,
            to,
        });
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
