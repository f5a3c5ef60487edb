//! Commands for the order context.

use uuid::Uuid;

/// Command to open a new order for a customer.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order to create.
    pub order_id: String,
    /// The ordering customer.
    pub customer_id: String,
}

/// Command to add a line item to an open order.
#[derive(Debug, Clone)]
pub struct AddItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order receiving the item.
    pub order_id: String,
    /// Stock-keeping unit.
    pub sku: String,
    /// Number of units.
    pub quantity: u32,
    /// Price of one unit, in cents.
    pub unit_price_cents: u64,
}

/// Command to ship an order.
#[derive(Debug, Clone)]
pub struct ShipOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The order to ship.
    pub order_id: String,
    /// Carrier tracking number.
    pub tracking_number: String,
}
