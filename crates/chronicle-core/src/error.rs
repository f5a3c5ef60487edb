//! Domain error types.

use chronicle_marshaling::MarshalError;
use thiserror::Error;

/// Top-level error type for aggregates, dispatch and stores.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An event's aggregate type does not match the aggregate it is applied to.
    #[error("invalid aggregate: expected type {expected:?}, event carries {actual:?}")]
    InvalidAggregate {
        /// The aggregate's own type tag.
        expected: String,
        /// The type tag recorded on the event.
        actual: String,
    },

    /// An event's aggregate id does not match the aggregate instance.
    #[error("invalid aggregate id: expected {expected:?}, event carries {actual:?}")]
    InvalidAggregateId {
        /// The aggregate's own id.
        expected: String,
        /// The id recorded on the event.
        actual: String,
    },

    /// An event type tag is empty or otherwise unusable.
    #[error("invalid event type: {0:?}")]
    InvalidEventType(String),

    /// The event's version does not strictly follow the aggregate's version.
    #[error("invalid event version: aggregate is at {current}, event has {event}")]
    InvalidEventVersion {
        /// The aggregate's version when the event was applied.
        current: u64,
        /// The version carried by the event.
        event: u64,
    },

    /// An aggregate was not found in the store.
    #[error("aggregate not found: {aggregate_type}/{aggregate_id}")]
    AggregateNotFound {
        /// Type tag of the missing aggregate.
        aggregate_type: String,
        /// Id of the missing aggregate.
        aggregate_id: String,
    },

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: String,
        /// The version the writer last saw.
        expected: u64,
        /// The version found in the store.
        actual: u64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An event payload could not be encoded or decoded.
    #[error("payload error: {0}")]
    Payload(#[from] MarshalError),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for failures that may succeed when retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Infrastructure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_infrastructure_errors_are_transient() {
        assert!(DomainError::Infrastructure("connection reset".into()).is_transient());
        assert!(!DomainError::Validation("bad input".into()).is_transient());
        assert!(
            !DomainError::ConcurrencyConflict {
                aggregate_id: "a1".into(),
                expected: 1,
                actual: 2,
            }
            .is_transient()
        );
    }

    #[test]
    fn test_invalid_event_version_message_names_both_versions() {
        let err = DomainError::InvalidEventVersion {
            current: 3,
            event: 2,
        };

        assert_eq!(
            err.to_string(),
            "invalid event version: aggregate is at 3, event has 2"
        );
    }
}
