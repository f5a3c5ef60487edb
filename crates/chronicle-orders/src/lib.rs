//! Chronicle: order-fulfilment bounded context.
//!
//! A small domain built on the toolkit: orders are created for a customer,
//! collect line items, and are shipped. Every change is an event.

pub mod application;
pub mod domain;
