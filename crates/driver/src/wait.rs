//! Bounded predicate wait.
//!
//! Replaces the fixed-duration sleeps the original scripts interleaved with
//! re-attempts: callers supply a condition and a timeout, and polling stops
//! the moment the condition holds. A timed-out wait is a normal outcome for
//! fallback logic to classify, not an error.

use crate::errors::DriverError;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Polling parameters for [`wait_until`].
#[derive(Clone, Copy, Debug)]
pub struct WaitOpts {
    /// Total time budget for the wait.
    pub timeout: Duration,

    /// Pause between condition probes.
    pub poll_interval: Duration,
}

impl Default for WaitOpts {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3_000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl WaitOpts {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Result of a bounded wait.
#[derive(Clone, Copy, Debug)]
pub struct WaitOutcome {
    /// Whether the condition held before the budget ran out.
    pub satisfied: bool,

    /// Number of condition probes performed.
    pub attempts: u32,

    /// Wall time spent waiting.
    pub elapsed: Duration,
}

/// Poll `condition` until it returns `true` or `opts.timeout` elapses.
///
/// The condition is always probed at least once, even with a zero budget.
/// Condition errors are logged and counted as an unsatisfied probe, matching
/// the resolver's warn-and-continue treatment of flaky driver calls.
pub async fn wait_until<F, Fut>(opts: WaitOpts, mut condition: F) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, DriverError>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match condition().await {
            Ok(true) => {
                debug!(attempts, "wait condition satisfied");
                return WaitOutcome {
                    satisfied: true,
                    attempts,
                    elapsed: started.elapsed(),
                };
            }
            Ok(false) => {}
            Err(err) => {
                warn!(attempts, error = %err, "wait condition probe failed");
            }
        }

        if started.elapsed() >= opts.timeout {
            debug!(attempts, timeout_ms = opts.timeout.as_millis() as u64, "wait timed out");
            return WaitOutcome {
                satisfied: false,
                attempts,
                elapsed: started.elapsed(),
            };
        }

        tokio::time::sleep(opts.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn satisfied_on_first_probe() {
        let outcome = wait_until(WaitOpts::default(), || async { Ok(true) }).await;
        assert!(outcome.satisfied);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn satisfied_after_several_probes() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe_calls = calls.clone();
        let opts = WaitOpts {
            timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(1),
        };

        let outcome = wait_until(opts, move || {
            let calls = probe_calls.clone();
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2) }
        })
        .await;

        assert!(outcome.satisfied);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn times_out_when_never_satisfied() {
        let opts = WaitOpts {
            timeout: Duration::from_millis(20),
            poll_interval: Duration::from_millis(5),
        };
        let outcome = wait_until(opts, || async { Ok(false) }).await;
        assert!(!outcome.satisfied);
        assert!(outcome.attempts >= 2);
    }

    #[tokio::test]
    async fn probe_errors_count_as_unsatisfied() {
        let opts = WaitOpts {
            timeout: Duration::from_millis(10),
            poll_interval: Duration::from_millis(2),
        };
        let outcome = wait_until(opts, || async {
            Err(DriverError::Io("socket closed".into()))
        })
        .await;
        assert!(!outcome.satisfied);
    }

    #[tokio::test]
    async fn zero_budget_still_probes_once() {
        let opts = WaitOpts {
            timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
        };
        let outcome = wait_until(opts, || async { Ok(true) }).await;
        assert!(outcome.satisfied);
        assert_eq!(outcome.attempts, 1);
    }
}
