//! Domain layer: aggregate, commands and event payloads.

pub mod aggregates;
pub mod commands;
pub mod events;
