//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap each transport attempt with the endpoint's deadline
//! - Cancel the attempt cleanly on expiry (the future is dropped)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Every attempt gets a fresh budget; expiry is an ordinary timeout failure
//!   that goes through classification and retry like any other

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::transport::TransportError;

/// Run `call` under `deadline`, mapping expiry to `TransportError::Timeout`.
pub async fn with_deadline<F, T>(deadline: Duration, call: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout {
            after_ms: deadline.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, TransportError>(())
        };
        let err = with_deadline(Duration::from_millis(250), slow).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout { after_ms: 250 }));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, TransportError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
