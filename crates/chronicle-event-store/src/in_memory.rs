//! In-memory implementation of the `AggregateStore` trait.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chronicle_core::aggregate::Aggregate;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::store::AggregateStore;
use tracing::info;

/// Stream key: aggregate type, aggregate id.
type StreamKey = (String, String);

/// Process-local aggregate store. Each aggregate is an append-only stream of
/// events; saves are rejected unless they continue the stream exactly where
/// the saving instance last saw it.
#[derive(Debug, Default)]
pub struct InMemoryAggregateStore {
    streams: Mutex<HashMap<StreamKey, Vec<Event>>>,
}

impl InMemoryAggregateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored events of one aggregate, oldest first.
    #[must_use]
    pub fn stream(&self, aggregate_type: &str, aggregate_id: &str) -> Vec<Event> {
        self.lock()
            .get(&key(aggregate_type, aggregate_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the version of the last stored event of one aggregate, or 0.
    #[must_use]
    pub fn stream_version(&self, aggregate_type: &str, aggregate_id: &str) -> u64 {
        self.lock()
            .get(&key(aggregate_type, aggregate_id))
            .and_then(|events| events.last())
            .map_or(0, Event::version)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<StreamKey, Vec<Event>>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key(aggregate_type: &str, aggregate_id: &str) -> StreamKey {
    (aggregate_type.to_owned(), aggregate_id.to_owned())
}

#[async_trait]
impl AggregateStore for InMemoryAggregateStore {
    async fn load_aggregate(&self, aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        let events = self
            .lock()
            .get(&key(aggregate.aggregate_type(), aggregate.id()))
            .cloned()
            .ok_or_else(|| DomainError::AggregateNotFound {
                aggregate_type: aggregate.aggregate_type().to_owned(),
                aggregate_id: aggregate.id().to_owned(),
            })?;

        aggregate.load(&events)
    }

    async fn save_aggregate(&self, aggregate: &dyn Aggregate) -> Result<(), DomainError> {
        let events = aggregate.events();
        let Some(first) = events.first() else {
            return Ok(());
        };
        let expected = first.version().saturating_sub(1);

        let stream_key = key(aggregate.aggregate_type(), aggregate.id());
        let mut streams = self.lock();
        let actual = streams
            .get(&stream_key)
            .and_then(|stream| stream.last())
            .map_or(0, Event::version);
        if actual != expected {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: aggregate.id().to_owned(),
                expected,
                actual,
            });
        }

        let event_count = events.len();
        streams.entry(stream_key).or_default().extend(events);

        info!(
            aggregate_type = aggregate.aggregate_type(),
            aggregate_id = aggregate.id(),
            new_version = aggregate.version(),
            event_count,
            "appended events to aggregate stream"
        );
        Ok(())
    }
}
