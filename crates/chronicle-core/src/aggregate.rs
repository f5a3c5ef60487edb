//! Aggregate contract and the reusable aggregate root.

use std::fmt;

use crate::error::DomainError;
use crate::event::Event;

const EVENTS_INITIAL_CAPACITY: usize = 10;

/// Trait for domain objects that record their changes as events.
pub trait Aggregate: Send + Sync {
    /// Returns the aggregate identifier.
    fn id(&self) -> &str;

    /// Returns the aggregate type tag.
    fn aggregate_type(&self) -> &str;

    /// Returns the version of the last applied event.
    fn version(&self) -> u64;

    /// Returns a copy of the uncommitted events, in application order.
    fn events(&self) -> Vec<Event>;

    /// Records a new, unversioned event produced by business logic.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the event belongs to another aggregate, is
    /// already versioned, has an empty type, or is rejected by the aggregate's
    /// transition function.
    fn add(&mut self, event: Event) -> Result<(), DomainError>;

    /// Replays historical, versioned events to rebuild state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` at the first event that does not belong to this
    /// aggregate, does not advance its version, or is rejected by the
    /// transition function. Events before it remain applied.
    fn load(&mut self, events: &[Event]) -> Result<(), DomainError>;

    /// Returns `true` if events were added since the last commit.
    fn has_uncommitted_events(&self) -> bool;

    /// Marks all uncommitted events as persisted.
    fn commit_events(&mut self);
}

/// State transition function: mutates the aggregate state for one event.
pub type When<S> = Box<dyn Fn(&mut S, &Event) -> Result<(), DomainError> + Send + Sync>;

/// Reusable [`Aggregate`] implementation.
///
/// The root owns the domain state `S` and the transition function that
/// mutates it. `version` moves on every applied event; `global_version` only
/// moves on load and commit, so the gap between the two is what has not yet
/// been persisted.
pub struct AggregateRoot<S> {
    id: String,
    aggregate_type: String,
    version: u64,
    global_version: u64,
    events: Vec<Event>,
    state: S,
    when: When<S>,
}

impl<S> AggregateRoot<S> {
    /// Creates a fresh root at version 0.
    pub fn new<F>(
        id: impl Into<String>,
        aggregate_type: impl Into<String>,
        state: S,
        when: F,
    ) -> Self
    where
        F: Fn(&mut S, &Event) -> Result<(), DomainError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            aggregate_type: aggregate_type.into(),
            version: 0,
            global_version: 0,
            events: Vec::with_capacity(EVENTS_INITIAL_CAPACITY),
            state,
            when: Box::new(when),
        }
    }

    /// Returns the version last known to the persistence layer.
    #[must_use]
    pub fn global_version(&self) -> u64 {
        self.global_version
    }

    /// Returns the domain state.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    fn check_aggregate_type(&self, event: &Event) -> Result<(), DomainError> {
        if event.aggregate_type() == self.aggregate_type {
            Ok(())
        } else {
            Err(DomainError::InvalidAggregate {
                expected: self.aggregate_type.clone(),
                actual: event.aggregate_type().to_owned(),
            })
        }
    }

    /// Shared by `load` and `add`: identity check, version gate, transition.
    /// Leaves the root untouched on failure.
    fn apply(&mut self, event: &Event) -> Result<(), DomainError> {
        if event.aggregate_id() != self.id {
            return Err(DomainError::InvalidAggregateId {
                expected: self.id.clone(),
                actual: event.aggregate_id().to_owned(),
            });
        }
        if self.version >= event.version() {
            return Err(DomainError::InvalidEventVersion {
                current: self.version,
                event: event.version(),
            });
        }

        (self.when)(&mut self.state, event)
    }
}

impl<S: Send + Sync> Aggregate for AggregateRoot<S> {
    fn id(&self) -> &str {
        &self.id
    }

    fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn events(&self) -> Vec<Event> {
        self.events.clone()
    }

    fn add(&mut self, mut event: Event) -> Result<(), DomainError> {
        self.check_aggregate_type(&event)?;
        if event.event_type().is_empty() {
            return Err(DomainError::InvalidEventType(String::new()));
        }
        if event.version() != 0 {
            return Err(DomainError::InvalidEventVersion {
                current: self.version,
                event: event.version(),
            });
        }

        // Stamp the prospective version first so the gate in `apply` holds
        // for the first event of a fresh root.
        event.stamp_version(self.version + 1);
        self.apply(&event)?;

        self.version = event.version();
        self.events.push(event);
        Ok(())
    }

    fn load(&mut self, events: &[Event]) -> Result<(), DomainError> {
        for event in events {
            self.check_aggregate_type(event)?;
            self.apply(event)?;
            self.version = event.version();
            self.global_version = event.version();
        }
        Ok(())
    }

    fn has_uncommitted_events(&self) -> bool {
        !self.events.is_empty()
    }

    fn commit_events(&mut self) {
        self.global_version = self.version;
        self.events = Vec::with_capacity(EVENTS_INITIAL_CAPACITY);
    }
}

impl<S: fmt::Debug> fmt::Debug for AggregateRoot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateRoot")
            .field("id", &self.id)
            .field("aggregate_type", &self.aggregate_type)
            .field("version", &self.version)
            .field("global_version", &self.global_version)
            .field("events", &self.events)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
