//! Test stores: mock `AggregateStore` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chronicle_core::aggregate::Aggregate;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::store::AggregateStore;

/// One recorded `save_aggregate` call.
#[derive(Debug, Clone)]
pub struct SavedBatch {
    /// Id of the saved aggregate.
    pub aggregate_id: String,
    /// Aggregate version before the saved events.
    pub expected_version: u64,
    /// The uncommitted events that were saved.
    pub events: Vec<Event>,
}

/// A store that replays a fixed history on every `load_aggregate` call and
/// records every `save_aggregate` call. Saves always succeed.
#[derive(Debug)]
pub struct RecordingAggregateStore {
    history: Vec<Event>,
    saved: Mutex<Vec<SavedBatch>>,
}

impl RecordingAggregateStore {
    /// Create a new recording store that loads `history` into every aggregate.
    #[must_use]
    pub fn new(history: Vec<Event>) -> Self {
        Self {
            history,
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all saved batches.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved(&self) -> Vec<SavedBatch> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl AggregateStore for RecordingAggregateStore {
    async fn load_aggregate(&self, aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        aggregate.load(&self.history)
    }

    async fn save_aggregate(&self, aggregate: &dyn Aggregate) -> Result<(), DomainError> {
        let events = aggregate.events();
        let expected_version = aggregate.version() - events.len() as u64;
        self.saved.lock().unwrap().push(SavedBatch {
            aggregate_id: aggregate.id().to_owned(),
            expected_version,
            events,
        });
        Ok(())
    }
}

/// A store with no history that silently accepts saves. Useful for testing
/// creation commands.
#[derive(Debug)]
pub struct EmptyAggregateStore;

#[async_trait]
impl AggregateStore for EmptyAggregateStore {
    async fn load_aggregate(&self, _aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        Ok(())
    }

    async fn save_aggregate(&self, _aggregate: &dyn Aggregate) -> Result<(), DomainError> {
        Ok(())
    }
}

/// A store that always returns an infrastructure error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingAggregateStore;

#[async_trait]
impl AggregateStore for FailingAggregateStore {
    async fn load_aggregate(&self, _aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn save_aggregate(&self, _aggregate: &dyn Aggregate) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// A store whose first `failures` calls fail with an infrastructure error;
/// later calls succeed without touching the aggregate. Counts every call.
#[derive(Debug)]
pub struct FlakyAggregateStore {
    failures: u32,
    attempts: AtomicU32,
}

impl FlakyAggregateStore {
    /// Create a store that fails `failures` times before succeeding.
    #[must_use]
    pub fn new(failures: u32) -> Self {
        Self {
            failures,
            attempts: AtomicU32::new(0),
        }
    }

    /// Returns how many calls were made, successful or not.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn attempt(&self) -> Result<(), DomainError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            Err(DomainError::Infrastructure(format!(
                "transient failure on attempt {attempt}"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AggregateStore for FlakyAggregateStore {
    async fn load_aggregate(&self, _aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        self.attempt()
    }

    async fn save_aggregate(&self, _aggregate: &dyn Aggregate) -> Result<(), DomainError> {
        self.attempt()
    }
}

/// A store whose loads apply the first `applied` events of `history` and then
/// fail with an infrastructure error. Counts every load.
#[derive(Debug)]
pub struct PartialLoadAggregateStore {
    history: Vec<Event>,
    applied: usize,
    attempts: AtomicU32,
}

impl PartialLoadAggregateStore {
    /// Create a store that applies `applied` events of `history` per load.
    #[must_use]
    pub fn new(history: Vec<Event>, applied: usize) -> Self {
        Self {
            history,
            applied,
            attempts: AtomicU32::new(0),
        }
    }

    /// Returns how many loads were made.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AggregateStore for PartialLoadAggregateStore {
    async fn load_aggregate(&self, aggregate: &mut dyn Aggregate) -> Result<(), DomainError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let end = self.applied.min(self.history.len());
        aggregate.load(&self.history[..end])?;
        Err(DomainError::Infrastructure("stream read interrupted".into()))
    }

    async fn save_aggregate(&self, _aggregate: &dyn Aggregate) -> Result<(), DomainError> {
        Ok(())
    }
}
