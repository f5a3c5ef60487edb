//! Aggregate persistence boundary.

use std::sync::Arc;

use async_trait::async_trait;

use crate::aggregate::Aggregate;
use crate::dispatcher::EventPublisher;
use crate::error::DomainError;
use crate::event::Event;

/// Loads and saves aggregates as event streams.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Replays the stored events of `aggregate` into it via [`Aggregate::load`].
    ///
    /// A transient failure should leave the aggregate untouched. A failure
    /// after some events were applied is never retried by middleware.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if no stream exists,
    /// `DomainError::Infrastructure` if the store is unavailable, or whatever
    /// `load` rejects.
    async fn load_aggregate(&self, aggregate: &mut dyn Aggregate) -> Result<(), DomainError>;

    /// Appends the uncommitted events of `aggregate`.
    ///
    /// The caller commits the aggregate after this succeeds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stored stream has moved
    /// past the version this instance last loaded, or
    /// `DomainError::Infrastructure` if the store is unavailable.
    async fn save_aggregate(&self, aggregate: &dyn Aggregate) -> Result<(), DomainError>;
}

/// Wraps a store with cross-cutting behavior, returning a store with the
/// same contract.
pub type AggregateStoreMiddleware =
    Box<dyn FnOnce(Arc<dyn AggregateStore>) -> Arc<dyn AggregateStore> + Send>;

/// Applies `middleware` to `store` in order: the first entry wraps the base
/// store directly, the last one is outermost.
pub fn with_middleware<I>(
    store: Arc<dyn AggregateStore>,
    middleware: I,
) -> Arc<dyn AggregateStore>
where
    I: IntoIterator<Item = AggregateStoreMiddleware>,
{
    middleware.into_iter().fold(store, |next, wrap| wrap(next))
}

/// Saves `aggregate`, commits it, then publishes what was saved.
///
/// Returns the published events; an aggregate with nothing uncommitted is a
/// no-op.
///
/// # Errors
///
/// A save failure leaves the aggregate uncommitted. A publish failure is
/// returned after the events are already persisted and committed.
pub async fn save_and_publish(
    store: &dyn AggregateStore,
    publisher: &dyn EventPublisher,
    aggregate: &mut dyn Aggregate,
) -> Result<Vec<Event>, DomainError> {
    let events = aggregate.events();
    if events.is_empty() {
        return Ok(events);
    }

    store.save_aggregate(&*aggregate).await?;
    aggregate.commit_events();
    publisher.publish(&events).await?;
    Ok(events)
}
