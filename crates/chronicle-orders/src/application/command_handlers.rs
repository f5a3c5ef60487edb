//! Command handlers for the order context.
//!
//! Each handler loads the aggregate, executes the command, then saves and
//! publishes the resulting events.

use chronicle_core::aggregate::Aggregate;
use chronicle_core::clock::Clock;
use chronicle_core::dispatcher::EventPublisher;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::store::{AggregateStore, save_and_publish};
use tracing::info;

use crate::domain::aggregates::{LineItem, Order};
use crate::domain::commands::{AddItem, CreateOrder, ShipOrder};

/// Loads an existing order from `store`.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the store has no events for
/// the order, or whatever the store returns.
pub(crate) async fn load_order(
    order_id: &str,
    store: &dyn AggregateStore,
) -> Result<Order, DomainError> {
    let mut order = Order::new(order_id);
    store.load_aggregate(&mut order).await?;
    if order.version() == 0 {
        return Err(DomainError::AggregateNotFound {
            aggregate_type: order.aggregate_type().to_owned(),
            aggregate_id: order_id.to_owned(),
        });
    }
    Ok(order)
}

/// Handles the `CreateOrder` command.
///
/// # Errors
///
/// Returns `DomainError::ConcurrencyConflict` from stores that already hold
/// the order, or any save or publish error.
pub async fn handle_create_order(
    command: &CreateOrder,
    clock: &dyn Clock,
    store: &dyn AggregateStore,
    publisher: &dyn EventPublisher,
) -> Result<Vec<Event>, DomainError> {
    let mut order = Order::new(command.order_id.as_str());
    order.create(&command.customer_id, command.correlation_id, clock)?;

    let events = save_and_publish(store, publisher, &mut order).await?;
    info!(
        order_id = %command.order_id,
        correlation_id = %command.correlation_id,
        "order created"
    );
    Ok(events)
}

/// Handles the `AddItem` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for unknown orders,
/// `DomainError::Validation` if the order rejects the item, or any store or
/// publish error.
pub async fn handle_add_item(
    command: &AddItem,
    clock: &dyn Clock,
    store: &dyn AggregateStore,
    publisher: &dyn EventPublisher,
) -> Result<Vec<Event>, DomainError> {
    let mut order = load_order(&command.order_id, store).await?;
    let item = LineItem {
        sku: command.sku.clone(),
        quantity: command.quantity,
        unit_price_cents: command.unit_price_cents,
    };
    order.add_item(item, command.correlation_id, clock)?;

    save_and_publish(store, publisher, &mut order).await
}

/// Handles the `ShipOrder` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for unknown orders,
/// `DomainError::Validation` if the order cannot ship, or any store or
/// publish error.
pub async fn handle_ship_order(
    command: &ShipOrder,
    clock: &dyn Clock,
    store: &dyn AggregateStore,
    publisher: &dyn EventPublisher,
) -> Result<Vec<Event>, DomainError> {
    let mut order = load_order(&command.order_id, store).await?;
    order.ship(&command.tracking_number, command.correlation_id, clock)?;

    let events = save_and_publish(store, publisher, &mut order).await?;
    info!(
        order_id = %command.order_id,
        correlation_id = %command.correlation_id,
        "order shipped"
    );
    Ok(events)
}
