//! Shared test doubles for the Chronicle event-sourcing toolkit.

mod clock;
mod handler;
mod store;

pub use clock::FixedClock;
pub use handler::RecordingHandler;
pub use store::{
    EmptyAggregateStore, FailingAggregateStore, FlakyAggregateStore, PartialLoadAggregateStore,
    RecordingAggregateStore, SavedBatch,
};
