//! Retry classification and the fixed-budget fetch loop
//!
//! Traversal strategies tolerate a limited number of consecutive fetch
//! failures. Unlike exponential-backoff schemes, the platform client
//! sleeps a fixed duration after each error: the goal is to ride out
//! brief rate-limit windows, not to recover an unstable network.

use crate::error::{Error, FetchError};
use crate::pacing::RequestPacer;
use std::future::Future;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, platform 5xx/429) should return
/// `true`. Permanent failures (bad task input, database errors) should
/// return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            // Rate limiting and upstream hiccups clear up after the backoff;
            // client errors such as 403/404 will not
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            // A rejected credential can succeed on the next pool pick
            FetchError::Auth { .. } => true,
            FetchError::Decode(_) => false,
        }
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Fetch(e) => e.is_retryable(),
            // Everything else is an application-level failure
            Error::Config { .. }
            | Error::Database(_)
            | Error::Sqlx(_)
            | Error::InvalidTask(_)
            | Error::NotFound(_)
            | Error::Task(_)
            | Error::ShuttingDown
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::ApiServerError(_)
            | Error::Other(_) => false,
        }
    }
}

/// Execute an async fetch with a consecutive-failure budget
///
/// The operation is attempted until it succeeds or `budget` consecutive
/// retryable failures have accumulated. After every failure the pacer's
/// fixed error backoff is slept. Non-retryable errors are returned
/// immediately without consuming the budget.
///
/// Strategies that interleave many fetches reset their own outer budget
/// on success; this helper covers a single fetch position.
pub async fn fetch_with_budget<F, Fut, T, E>(
    budget: u32,
    pacer: &RequestPacer,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut failures = 0u32;

    loop {
        match operation().await {
            Ok(result) => {
                if failures > 0 {
                    tracing::info!(attempts = failures + 1, "Fetch succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() => {
                failures += 1;
                if failures >= budget {
                    tracing::error!(
                        error = %e,
                        failures,
                        "Fetch failed, retry budget exhausted"
                    );
                    return Err(e);
                }
                tracing::warn!(
                    error = %e,
                    failures,
                    budget,
                    backoff_secs = pacer.error_backoff().as_secs(),
                    "Fetch failed, backing off before retry"
                );
                pacer.backoff().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Fetch failed with non-retryable error");
                return Err(e);
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_pacer() -> RequestPacer {
        RequestPacer::new(&HarvestConfig {
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            error_backoff: Duration::from_millis(10),
            ..HarvestConfig::default()
        })
    }

    #[tokio::test]
    async fn success_needs_no_retry() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_budget(3, &fast_pacer(), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FetchError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn transient_failures_within_budget_then_succeed() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_budget(3, &fast_pacer(), || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(FetchError::Network("reset".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_exhaustion_returns_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_budget(3, &fast_pacer(), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(FetchError::Network("down".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "budget of 3 means exactly 3 attempts"
        );
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_budget(3, &fast_pacer(), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(FetchError::Decode("bad json".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1, "no retry on decode error");
    }

    #[tokio::test]
    async fn backoff_is_slept_between_attempts() {
        let start = std::time::Instant::now();

        let _result = fetch_with_budget(3, &fast_pacer(), || async {
            Err::<i32, _>(FetchError::Network("down".into()))
        })
        .await;

        // Two backoffs of ~10ms between three attempts
        assert!(
            start.elapsed() >= Duration::from_millis(18),
            "expected at least two backoff sleeps, elapsed {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn fetch_error_classification() {
        assert!(FetchError::Network("timeout".into()).is_retryable());
        assert!(
            FetchError::Status {
                status: 429,
                body: "slow down".into()
            }
            .is_retryable()
        );
        assert!(
            FetchError::Status {
                status: 503,
                body: "busy".into()
            }
            .is_retryable()
        );
        assert!(
            !FetchError::Status {
                status: 404,
                body: "no such community".into()
            }
            .is_retryable()
        );
        assert!(
            FetchError::Auth {
                label: "agent-1".into(),
                reason: "invalid_grant".into()
            }
            .is_retryable()
        );
        assert!(!FetchError::Decode("truncated".into()).is_retryable());
    }

    #[test]
    fn application_errors_are_never_retryable() {
        use crate::error::DatabaseError;

        assert!(!Error::InvalidTask("bad query".into()).is_retryable());
        assert!(!Error::NotFound("task 1".into()).is_retryable());
        assert!(
            !Error::Database(DatabaseError::QueryFailed("locked".into())).is_retryable()
        );
        assert!(!Error::ShuttingDown.is_retryable());
        assert!(!Error::Other("unknown".into()).is_retryable());
    }

    #[test]
    fn fetch_errors_delegate_through_error() {
        let err = Error::Fetch(FetchError::Network("reset".into()));
        assert!(err.is_retryable());

        let err = Error::Fetch(FetchError::Decode("bad".into()));
        assert!(!err.is_retryable());
    }
}
