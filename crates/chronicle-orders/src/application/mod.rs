//! Application layer: command handlers, query handlers and event subscribers.

pub mod command_handlers;
pub mod query_handlers;
pub mod subscribers;
