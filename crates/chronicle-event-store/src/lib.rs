//! Chronicle Event Store: aggregate store implementations.
//!
//! Provides an in-memory [`AggregateStore`](chronicle_core::AggregateStore)
//! with optimistic concurrency and the middleware that can be layered over any
//! store with [`with_middleware`](chronicle_core::with_middleware).

pub mod in_memory;
pub mod middleware;

pub use in_memory::InMemoryAggregateStore;
pub use middleware::{RetryPolicy, instrumented, retrying};
