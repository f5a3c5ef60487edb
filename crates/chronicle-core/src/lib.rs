//! Chronicle Core: event-sourcing building blocks.
//!
//! Defines the [`Event`] value type, the [`Aggregate`] contract with its
//! reusable [`AggregateRoot`], the in-process [`EventDispatcher`], and the
//! [`AggregateStore`] persistence boundary. It contains no I/O.

pub mod aggregate;
pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod store;

pub use aggregate::{Aggregate, AggregateRoot, When};
pub use chronicle_marshaling::{Format, MarshalError};
pub use clock::{Clock, SystemClock};
pub use dispatcher::{
    EventDispatcher, EventHandler, EventPublisher, EventSubscriber, HandlerFn, handler_fn,
};
pub use error::DomainError;
pub use event::Event;
pub use store::{AggregateStore, AggregateStoreMiddleware, save_and_publish, with_middleware};
