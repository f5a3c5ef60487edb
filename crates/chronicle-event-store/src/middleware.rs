//! Aggregate store middleware.
//!
//! Each constructor returns an [`AggregateStoreMiddleware`] for use with
//! [`with_middleware`](chronicle_core::with_middleware).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chronicle_core::aggregate::Aggregate;
use chronicle_core::error::DomainError;
use chronicle_core::store::{AggregateStore, AggregateStoreMiddleware};
use tokio::time::sleep;
use tracing::{Instrument, debug, info_span, warn};

/// Returns middleware that wraps every store call in a tracing span and logs
/// its outcome and duration.
#[must_use]
pub fn instrumented() -> AggregateStoreMiddleware {
    Box::new(|next: Arc<dyn AggregateStore>| -> Arc<dyn AggregateStore> {
        Arc::new(Instrumented { next })
    })
}

struct Instrumented {
    next: Arc<dyn AggregateStore>,
}

#[async_trait]
impl AggregateStore for Instrumented {
    async fn load_aggregate(&self, aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        let span = info_span!(
            "load_aggregate",
            aggregate_type = aggregate.aggregate_type(),
            aggregate_id = aggregate.id()
        );
        let started = Instant::now();
        let result = self
            .next
            .load_aggregate(&mut *aggregate)
            .instrument(span.clone())
            .await;
        let elapsed_ms = started.elapsed().as_millis();

        let version = aggregate.version();
        span.in_scope(|| match &result {
            Ok(()) => debug!(version, elapsed_ms, "aggregate loaded"),
            Err(error) => warn!(%error, elapsed_ms, "aggregate load failed"),
        });
        result
    }

    async fn save_aggregate(&self, aggregate: &dyn Aggregate) -> Result<(), DomainError> {
        let span = info_span!(
            "save_aggregate",
            aggregate_type = aggregate.aggregate_type(),
            aggregate_id = aggregate.id(),
            event_count = aggregate.events().len()
        );
        let started = Instant::now();
        let result = self
            .next
            .save_aggregate(aggregate)
            .instrument(span.clone())
            .await;
        let elapsed_ms = started.elapsed().as_millis();

        span.in_scope(|| match &result {
            Ok(()) => debug!(version = aggregate.version(), elapsed_ms, "aggregate saved"),
            Err(error) => warn!(%error, elapsed_ms, "aggregate save failed"),
        });
        result
    }
}

/// Exponential backoff settings for [`retrying`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Factor applied to the delay after each retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// More attempts with a shorter first delay.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    /// Fewer attempts for callers that prefer failing fast.
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        delay.mul_f64(self.multiplier.max(1.0)).min(self.max_delay)
    }
}

/// Returns middleware that retries store calls failing with a transient
/// error (see [`DomainError::is_transient`]). Other errors are returned
/// immediately, as is a failed load that already applied some events to
/// the aggregate.
#[must_use]
pub fn retrying(policy: RetryPolicy) -> AggregateStoreMiddleware {
    Box::new(move |next: Arc<dyn AggregateStore>| -> Arc<dyn AggregateStore> {
        Arc::new(Retrying { policy, next })
    })
}

struct Retrying {
    policy: RetryPolicy,
    next: Arc<dyn AggregateStore>,
}

/// Attempt counter and current delay of one retried call.
struct Backoff<'a> {
    policy: &'a RetryPolicy,
    attempt: u32,
    delay: Duration,
}

impl<'a> Backoff<'a> {
    fn new(policy: &'a RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 1,
            delay: policy.initial_delay,
        }
    }

    /// Decides whether `error` is worth another attempt, sleeping first if so.
    async fn retry(&mut self, operation: &str, error: &DomainError) -> bool {
        if !error.is_transient() || self.attempt >= self.policy.max_attempts {
            return false;
        }

        warn!(
            operation,
            attempt = self.attempt,
            max_attempts = self.policy.max_attempts,
            %error,
            delay_ms = self.delay.as_millis(),
            "store call failed, retrying after delay"
        );
        sleep(self.delay).await;
        self.attempt += 1;
        self.delay = self.policy.next_delay(self.delay);
        true
    }
}

#[async_trait]
impl AggregateStore for Retrying {
    async fn load_aggregate(&self, aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        let mut backoff = Backoff::new(&self.policy);
        loop {
            let before = aggregate.version();
            let result = self.next.load_aggregate(&mut *aggregate).await;
            if let Err(error) = &result {
                // A load that already applied events cannot be replayed.
                let untouched = aggregate.version() == before;
                if untouched && backoff.retry("load_aggregate", error).await {
                    continue;
                }
            }
            return result;
        }
    }

    async fn save_aggregate(&self, aggregate: &dyn Aggregate) -> Result<(), DomainError> {
        let mut backoff = Backoff::new(&self.policy);
        loop {
            let result = self.next.save_aggregate(aggregate).await;
            if let Err(error) = &result {
                if backoff.retry("save_aggregate", error).await {
                    continue;
                }
            }
            return result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_values() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_presets_differ_in_attempts() {
        assert!(RetryPolicy::aggressive().max_attempts > RetryPolicy::default().max_attempts);
        assert!(RetryPolicy::conservative().max_attempts < RetryPolicy::default().max_attempts);
    }

    #[test]
    fn test_delay_grows_until_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            multiplier: 2.0,
        };

        let second = policy.next_delay(policy.initial_delay);
        let third = policy.next_delay(second);

        assert_eq!(second, Duration::from_millis(200));
        assert_eq!(third, Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_backoff_gives_up_on_permanent_errors() {
        let policy = RetryPolicy {
            initial_delay: Duration::ZERO,
            ..RetryPolicy::default()
        };
        let mut backoff = Backoff::new(&policy);

        let retried = backoff
            .retry("save_aggregate", &DomainError::Validation("bad".into()))
            .await;

        assert!(!retried);
    }

    #[tokio::test]
    async fn test_backoff_stops_at_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::ZERO,
            ..RetryPolicy::default()
        };
        let mut backoff = Backoff::new(&policy);
        let error = DomainError::Infrastructure("timeout".into());

        assert!(backoff.retry("load_aggregate", &error).await);
        assert!(!backoff.retry("load_aggregate", &error).await);
    }
}
