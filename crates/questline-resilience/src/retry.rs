// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with a fixed delay.

use std::future::Future;
use std::time::Duration;

use questline_core::QuestlineError;
use tracing::{debug, warn};

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Runs `op` until it succeeds, `should_retry` rejects the error, or the
/// policy's attempts are exhausted. Returns the last error.
pub async fn retry<T, F, Fut, P>(
    policy: RetryPolicy,
    operation: &str,
    mut op: F,
    should_retry: P,
) -> Result<T, QuestlineError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, QuestlineError>>,
    P: Fn(&QuestlineError) -> bool,
{
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < attempts && should_retry(&e) => {
                warn!(operation, attempt, max_attempts = attempts, error = %e, "attempt failed, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = &AtomicU32::new(0);
        let result = retry(
            RetryPolicy::new(3, Duration::from_secs(1)),
            "test",
            move |_| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(QuestlineError::transport("flaky"))
                } else {
                    Ok(n)
                }
            },
            |_| true,
        )
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = retry(
            RetryPolicy::new(4, Duration::from_millis(250)),
            "test",
            move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(QuestlineError::transport("down"))
            },
            |_| true,
        )
        .await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(
            RetryPolicy::default(),
            "test",
            move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(QuestlineError::Cancelled)
            },
            QuestlineError::is_transient,
        )
        .await;
        assert!(matches!(result, Err(QuestlineError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let result = retry(RetryPolicy::new(0, Duration::ZERO), "test", |n| async move { Ok(n) }, |_| true).await;
        assert_eq!(result.unwrap(), 1);
    }
}
