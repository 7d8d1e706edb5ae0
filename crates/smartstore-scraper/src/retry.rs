//! Retry scheduling for the page fetcher.
//!
//! Provides a classified retry loop: fail-fast errors (404, malformed
//! input) are propagated immediately, transient errors (429, 403, 5xx,
//! timeouts) are retried up to the attempt budget with a linearly growing,
//! jittered delay. A 429 doubles the whole scheduled delay and honors a
//! numeric `Retry-After` when the server's ask is larger.
//!
//! # Backoff schedule (example with `base_delay = 1s`)
//!
//! | Attempt | Sleep before attempt |
//! |---------|----------------------|
//! | 1 (initial) | — |
//! | 2 | 1s × 1 + jitter |
//! | 3 | 1s × 2 + jitter |
//! | 4 | 1s × 3 + jitter |
//!
//! Jitter is uniform in `[0, 2 × base_delay)` — it desynchronizes retry
//! storms and breaks machine-regular timing. With `max_retries = 3` the
//! operation is attempted at most 4 times total.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ScraperError;

/// Per-call retry accumulator: attempt count, cumulative sleep, and the
/// last classified failure. Owned exclusively by one fetch call.
#[derive(Debug, Default)]
pub(crate) struct RetryState {
    pub attempts: u32,
    pub total_delay: Duration,
}

/// Scheduled delay before the attempt following `completed_attempts`
/// failures, excluding jitter sampling (the caller supplies `jitter_ms` so
/// the schedule itself stays testable).
pub(crate) fn backoff_delay_ms(
    base_ms: u64,
    completed_attempts: u64,
    jitter_ms: u64,
    extended: bool,
) -> u64 {
    let linear = base_ms.saturating_mul(completed_attempts);
    let delay = linear.saturating_add(jitter_ms);
    if extended {
        delay.saturating_mul(2)
    } else {
        delay
    }
}

/// Samples jitter uniformly from `[0, 2 × base_ms)`.
fn sample_jitter_ms(base_ms: u64) -> u64 {
    let cap = base_ms.saturating_mul(2);
    if cap == 0 {
        0
    } else {
        rand::rng().random_range(0..cap)
    }
}

/// Executes `operation` under the classified retry policy.
///
/// On success the result is returned immediately. On a fail-fast error the
/// error is returned without further attempts. On a transient error the
/// loop sleeps per the schedule above and tries again, up to `max_retries`
/// additional attempts after the first. When the budget is exhausted the
/// last classified failure is returned, with its attempt count rewritten
/// from the accumulator where the variant carries one.
pub(crate) async fn run_with_retries<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut state = RetryState::default();
    let mut last_error: Option<ScraperError> = None;
    let base_ms = u64::try_from(base_delay.as_millis()).unwrap_or(u64::MAX);

    for attempt in 1..=max_retries.saturating_add(1) {
        if let Some(prev) = last_error.as_ref().filter(|_| attempt > 1) {
            let rate_limited = matches!(prev, ScraperError::RateLimited { .. });
            let mut delay_ms = backoff_delay_ms(
                base_ms,
                u64::from(attempt - 1),
                sample_jitter_ms(base_ms),
                rate_limited,
            );
            if let ScraperError::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } = prev
            {
                // Honor the server's ask when it exceeds our own schedule.
                delay_ms = delay_ms.max(secs.saturating_mul(1_000));
            }
            tracing::warn!(
                attempt,
                max_retries,
                delay_ms,
                rate_limited,
                error = %prev,
                "transient fetch error — retrying after backoff"
            );
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            state.total_delay += Duration::from_millis(delay_ms);
        }

        state.attempts = attempt;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_fail_fast() => return Err(err),
            Err(err) => last_error = Some(err),
        }
    }

    let err = last_error.unwrap_or_else(|| ScraperError::FetchFailed {
        url: String::new(),
        attempts: state.attempts,
    });
    tracing::debug!(
        attempts = state.attempts,
        total_delay_ms = u64::try_from(state.total_delay.as_millis()).unwrap_or(u64::MAX),
        "retry budget exhausted"
    );
    Err(finalize(err, state.attempts))
}

/// Rewrites the attempt count into variants that report one.
fn finalize(err: ScraperError, attempts: u32) -> ScraperError {
    match err {
        ScraperError::Timeout { url, .. } => ScraperError::Timeout { url, attempts },
        ScraperError::FetchFailed { url, .. } => ScraperError::FetchFailed { url, attempts },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn unavailable() -> ScraperError {
        ScraperError::ServiceUnavailable {
            url: "https://smartstore.naver.com/shop/products/1".to_owned(),
            reason: "HTTP 503".to_owned(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = run_with_retries(3, Duration::ZERO, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_error_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = run_with_retries(3, Duration::ZERO, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(unavailable())
                } else {
                    Ok::<u32, ScraperError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_is_respected_exactly() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = run_with_retries(2, Duration::ZERO, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(unavailable())
            }
        })
        .await;
        // max_retries = 2 → exactly 3 attempts, never more.
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(ScraperError::ServiceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn fail_fast_error_is_not_retried() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = run_with_retries(3, Duration::ZERO, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::NotFound {
                    url: "https://smartstore.naver.com/shop/products/404".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::NotFound { .. })));
    }

    #[tokio::test]
    async fn timeout_error_reports_total_attempts() {
        let result = run_with_retries(2, Duration::ZERO, || async {
            Err::<u32, ScraperError>(ScraperError::Timeout {
                url: "https://smartstore.naver.com/shop/products/1".to_owned(),
                attempts: 0,
            })
        })
        .await;
        assert!(matches!(
            result,
            Err(ScraperError::Timeout { attempts: 3, .. })
        ));
    }

    #[test]
    fn schedule_grows_linearly_with_attempts() {
        assert_eq!(backoff_delay_ms(1_000, 1, 0, false), 1_000);
        assert_eq!(backoff_delay_ms(1_000, 2, 0, false), 2_000);
        assert_eq!(backoff_delay_ms(1_000, 3, 500, false), 3_500);
    }

    #[test]
    fn rate_limit_doubles_the_whole_delay() {
        assert_eq!(
            backoff_delay_ms(1_000, 2, 500, true),
            2 * backoff_delay_ms(1_000, 2, 500, false)
        );
    }

    #[test]
    fn zero_base_never_sleeps() {
        assert_eq!(backoff_delay_ms(0, 5, 0, true), 0);
    }
}
