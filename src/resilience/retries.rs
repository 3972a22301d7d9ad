//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a failure is retryable (by error kind)
//! - Execute retries with exponential backoff + jitter
//! - Enforce the per-call attempt budget
//!
//! # Design Decisions
//! - Never retry authentication or validation failures
//! - No delay after the final attempt
//! - Backoff sleeps are plain Tokio sleeps; dropping the call cancels them

use std::fmt::Display;
use std::future::Future;
use tokio::time::sleep;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::classifier::{Classify, ErrorKind};

/// Whether a failure of this kind may be retried.
pub fn is_retryable(kind: ErrorKind) -> bool {
    !matches!(
        kind,
        ErrorKind::AuthenticationError | ErrorKind::ValidationError
    )
}

/// Identifies the call being retried, for logs.
#[derive(Debug, Clone, Copy)]
pub struct RetryContext<'a> {
    pub endpoint_id: &'a str,
    pub request_id: &'a str,
}

/// Bounded retry executor.
#[derive(Debug, Clone)]
pub struct RetryHandler {
    config: RetryConfig,
}

impl RetryHandler {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent. Returns the last error on failure.
    pub async fn execute<F, Fut, T, E>(&self, ctx: RetryContext<'_>, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(
                            endpoint = %ctx.endpoint_id,
                            request_id = %ctx.request_id,
                            attempts = attempt + 1,
                            "Request succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            attempt += 1;
            let kind = err.kind();

            if !is_retryable(kind) {
                tracing::debug!(
                    endpoint = %ctx.endpoint_id,
                    request_id = %ctx.request_id,
                    attempt,
                    kind = %kind,
                    "Non-retryable failure"
                );
                return Err(err);
            }

            if attempt >= max_attempts {
                tracing::debug!(
                    endpoint = %ctx.endpoint_id,
                    request_id = %ctx.request_id,
                    attempts = attempt,
                    kind = %kind,
                    "Retry budget exhausted"
                );
                return Err(err);
            }

            let delay = calculate_backoff(attempt, &self.config);
            tracing::info!(
                endpoint = %ctx.endpoint_id,
                request_id = %ctx.request_id,
                attempt,
                delay = ?delay,
                kind = %kind,
                error = %err,
                "Retrying request"
            );
            metrics::record_retry(ctx.endpoint_id, kind);
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Debug)]
    struct Failure(ErrorKind);

    impl Classify for Failure {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    impl Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    const CTX: RetryContext<'static> = RetryContext {
        endpoint_id: "test",
        request_id: "req-1",
    };

    fn handler(max_attempts: u32) -> RetryHandler {
        RetryHandler::new(RetryConfig {
            max_attempts,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: false,
        })
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(ErrorKind::Timeout));
        assert!(is_retryable(ErrorKind::ConnectionError));
        assert!(is_retryable(ErrorKind::RateLimit));
        assert!(is_retryable(ErrorKind::ServerError));
        assert!(!is_retryable(ErrorKind::AuthenticationError));
        assert!(!is_retryable(ErrorKind::ValidationError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delays_follow_backoff_and_skip_last() {
        let started = Instant::now();
        let calls = Mutex::new(Vec::new());

        let result: Result<(), Failure> = handler(3)
            .execute(CTX, || {
                calls.lock().unwrap().push(started.elapsed());
                async { Err(Failure(ErrorKind::ServerError)) }
            })
            .await;

        assert!(result.is_err());
        let calls: Vec<u128> = calls
            .into_inner()
            .unwrap()
            .into_iter()
            .map(|d: Duration| d.as_millis())
            .collect();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], 0);
        assert!((1_000..1_005).contains(&(calls[1] - calls[0])));
        assert!((2_000..2_005).contains(&(calls[2] - calls[1])));
        // Returned right after the third failure, no trailing delay.
        assert_eq!(started.elapsed().as_millis(), calls[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_single_attempt() {
        for kind in [ErrorKind::AuthenticationError, ErrorKind::ValidationError] {
            let mut calls = 0;
            let started = Instant::now();
            let result: Result<(), Failure> = handler(5)
                .execute(CTX, || {
                    calls += 1;
                    async move { Err(Failure(kind)) }
                })
                .await;
            assert!(result.is_err());
            assert_eq!(calls, 1);
            assert_eq!(started.elapsed().as_millis(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let mut calls = 0;
        let result = handler(3)
            .execute(CTX, || {
                calls += 1;
                let n = calls;
                async move {
                    if n < 2 {
                        Err(Failure(ErrorKind::Timeout))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let mut calls = 0;
        let _: Result<(), Failure> = handler(0)
            .execute(CTX, || {
                calls += 1;
                async { Err(Failure(ErrorKind::ServerError)) }
            })
            .await;
        assert_eq!(calls, 1);
    }
}
