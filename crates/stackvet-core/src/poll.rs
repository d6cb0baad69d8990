//! Bounded polling for eventually consistent conditions.
//!
//! Some of the state the checks assert on only becomes observable a while
//! after provisioning returns (the SSM agent registers minutes after the
//! instance boots). [`poll_until`] wraps that wait in an explicit attempt
//! budget with a fixed delay and an external cancellation signal, so a
//! run-level deadline can preempt the loop instead of waiting out the full
//! budget.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Retry budget for one poll loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of predicate evaluations.
    pub max_attempts: u32,

    /// Fixed delay between evaluations.
    pub interval: Duration,
}

impl PollConfig {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for PollConfig {
    /// The SSM agent registration budget: 30 attempts, 10 seconds apart.
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(10),
        }
    }
}

/// What a poll loop observed before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Whether the predicate returned true within the budget.
    pub satisfied: bool,

    /// Predicate evaluations performed.
    pub attempts: u32,
}

/// Repeatedly evaluate `predicate` until it returns true, the attempt budget
/// is exhausted, or `cancel` fires.
///
/// The predicate runs immediately; sleeps only separate attempts, so success
/// on attempt `k` costs exactly `k - 1` waits and exhaustion after `n`
/// attempts costs `n - 1`. Exhaustion is an ordinary outcome, not an error —
/// the caller decides whether it fails a check.
///
/// The predicate must be idempotent: it may be evaluated any number of
/// times. Read-only resource queries qualify.
///
/// A `max_attempts` of zero returns unsatisfied without evaluating.
pub async fn poll_until<F, Fut>(
    config: PollConfig,
    cancel: &CancellationToken,
    mut predicate: F,
) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let mut attempts = 0u32;

    while attempts < config.max_attempts {
        if cancel.is_cancelled() {
            return PollOutcome {
                satisfied: false,
                attempts,
            };
        }

        attempts += 1;
        if predicate().await {
            return PollOutcome {
                satisfied: true,
                attempts,
            };
        }

        if attempts == config.max_attempts {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            _ = cancel.cancelled() => {
                return PollOutcome {
                    satisfied: false,
                    attempts,
                };
            }
        }
    }

    PollOutcome {
        satisfied: false,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting_predicate(
        counter: Arc<AtomicU32>,
        succeed_on: u32,
    ) -> impl FnMut() -> std::future::Ready<bool> {
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(n >= succeed_on)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_sleeps_never() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let start = tokio::time::Instant::now();

        let outcome = poll_until(
            PollConfig::new(5, Duration::from_secs(10)),
            &cancel,
            counting_predicate(counter.clone(), 1),
        )
        .await;

        assert!(outcome.satisfied);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_attempt_k_sleeps_k_minus_one_times() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let interval = Duration::from_secs(10);
        let start = tokio::time::Instant::now();

        let outcome = poll_until(
            PollConfig::new(5, interval),
            &cancel,
            counting_predicate(counter.clone(), 3),
        )
        .await;

        assert!(outcome.satisfied);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), interval * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_evaluates_exactly_max_attempts() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));
        let interval = Duration::from_secs(10);
        let start = tokio::time::Instant::now();

        let outcome = poll_until(
            PollConfig::new(4, interval),
            &cancel,
            counting_predicate(counter.clone(), u32::MAX),
        )
        .await;

        assert!(!outcome.satisfied);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        // No trailing sleep after the final evaluation
        assert_eq!(start.elapsed(), interval * 3);
    }

    #[tokio::test]
    async fn test_cancellation_preempts_the_wait() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        // Predicate cancels the run on its first evaluation, then fails;
        // the loop must bail during the following sleep.
        let outcome = poll_until(
            PollConfig::new(10, Duration::from_secs(3600)),
            &cancel,
            move || {
                token.cancel();
                std::future::ready(false)
            },
        )
        .await;

        assert!(!outcome.satisfied);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_evaluation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let counter = Arc::new(AtomicU32::new(0));

        let outcome = poll_until(
            PollConfig::new(3, Duration::from_millis(1)),
            &cancel,
            counting_predicate(counter.clone(), 1),
        )
        .await;

        assert!(!outcome.satisfied);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_budget_returns_unsatisfied() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));

        let outcome = poll_until(
            PollConfig::new(0, Duration::from_millis(1)),
            &cancel,
            counting_predicate(counter.clone(), 1),
        )
        .await;

        assert!(!outcome.satisfied);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
