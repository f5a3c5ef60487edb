//! Query handlers for the order context.
//!
//! Queries rebuild the aggregate from the store and return read-only views.

use chronicle_core::aggregate::Aggregate;
use chronicle_core::error::DomainError;
use chronicle_core::store::AggregateStore;
use serde::Serialize;

use crate::application::command_handlers;
use crate::domain::aggregates::{LineItem, OrderStatus};

/// Read-only view of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    /// The order identifier.
    pub order_id: String,
    /// The ordering customer.
    pub customer_id: Option<String>,
    /// Line items in the order they were added.
    pub items: Vec<LineItem>,
    /// Sum over all items, in cents.
    pub total_cents: u64,
    /// Current lifecycle stage.
    pub status: OrderStatus,
    /// Tracking number, once shipped.
    pub tracking_number: Option<String>,
    /// Current version (event count).
    pub version: u64,
}

/// Retrieves an order by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the order has no events, or
/// any error the store returns.
pub async fn get_order(
    order_id: &str,
    store: &dyn AggregateStore,
) -> Result<OrderView, DomainError> {
    let order = command_handlers::load_order(order_id, store).await?;
    let state = order.state();
    Ok(OrderView {
        order_id: order.id().to_owned(),
        customer_id: state.customer_id.clone(),
        items: state.items.clone(),
        total_cents: state.total_cents(),
        status: state.status,
        tracking_number: state.tracking_number.clone(),
        version: order.version(),
    })
}
