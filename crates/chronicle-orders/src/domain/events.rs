//! Domain events for the order context.
//!
//! Events travel as [`chronicle_core::Event`] values; the structs here are the
//! JSON payloads they carry, keyed by the event type constants.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type of [`OrderCreated`].
pub const ORDER_CREATED: &str = "order.created";
/// Event type of [`ItemAdded`].
pub const ITEM_ADDED: &str = "order.item_added";
/// Event type of [`OrderShipped`].
pub const ORDER_SHIPPED: &str = "order.shipped";

/// Emitted when an order is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    /// The ordering customer.
    pub customer_id: String,
}

/// Emitted when a line item is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    /// Stock-keeping unit.
    pub sku: String,
    /// Number of units.
    pub quantity: u32,
    /// Price of one unit, in cents.
    pub unit_price_cents: u64,
}

/// Emitted when an order leaves the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShipped {
    /// Carrier tracking number.
    pub tracking_number: String,
}

/// Metadata attached to every order event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEventMetadata {
    /// Correlation ID of the command that produced the event.
    pub correlation_id: Uuid,
}
