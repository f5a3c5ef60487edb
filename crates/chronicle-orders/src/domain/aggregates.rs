//! Aggregate root for the order context.

use chronicle_core::MarshalError;
use chronicle_core::aggregate::{Aggregate, AggregateRoot};
use chronicle_core::clock::Clock;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use serde::Serialize;
use uuid::Uuid;

use super::events::{
    ITEM_ADDED, ItemAdded, ORDER_CREATED, ORDER_SHIPPED, OrderCreated, OrderEventMetadata,
    OrderShipped,
};

/// Aggregate type tag of [`Order`].
pub const ORDER_AGGREGATE_TYPE: &str = "Order";

/// Lifecycle stage of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// No `order.created` event yet.
    #[default]
    Draft,
    /// Accepting items.
    Open,
    /// Shipped; no further changes.
    Shipped,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// Stock-keeping unit.
    pub sku: String,
    /// Number of units.
    pub quantity: u32,
    /// Price of one unit, in cents.
    pub unit_price_cents: u64,
}

/// State rebuilt from an order's events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderState {
    /// The ordering customer, once created.
    pub customer_id: Option<String>,
    /// Line items in the order they were added.
    pub items: Vec<LineItem>,
    /// Current lifecycle stage.
    pub status: OrderStatus,
    /// Tracking number, once shipped.
    pub tracking_number: Option<String>,
}

impl OrderState {
    /// Sum of quantity times unit price over all items. Items that would
    /// push this past `u64::MAX` are rejected when added.
    #[must_use]
    pub fn total_cents(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity) * item.unit_price_cents)
            .sum()
    }

    fn require_open(&self) -> Result<(), DomainError> {
        match self.status {
            OrderStatus::Open => Ok(()),
            OrderStatus::Draft => {
                Err(DomainError::Validation("order has not been created".into()))
            }
            OrderStatus::Shipped => {
                Err(DomainError::Validation("order has already shipped".into()))
            }
        }
    }

    fn total_with(&self, quantity: u32, unit_price_cents: u64) -> Result<u64, DomainError> {
        u64::from(quantity)
            .checked_mul(unit_price_cents)
            .and_then(|line| self.total_cents().checked_add(line))
            .ok_or_else(|| DomainError::Validation("order total exceeds the maximum".into()))
    }
}

/// Transition function of [`Order`]. Business rules live here, so an event
/// that breaks one is rejected before it is recorded.
fn when(state: &mut OrderState, event: &Event) -> Result<(), DomainError> {
    match event.event_type() {
        ORDER_CREATED => {
            if state.status != OrderStatus::Draft {
                return Err(DomainError::Validation("order already exists".into()));
            }
            let payload: OrderCreated = event.json_data()?;
            state.customer_id = Some(payload.customer_id);
            state.status = OrderStatus::Open;
        }
        ITEM_ADDED => {
            state.require_open()?;
            let payload: ItemAdded = event.json_data()?;
            if payload.quantity == 0 {
                return Err(DomainError::Validation(
                    "item quantity must be positive".into(),
                ));
            }
            state.total_with(payload.quantity, payload.unit_price_cents)?;
            state.items.push(LineItem {
                sku: payload.sku,
                quantity: payload.quantity,
                unit_price_cents: payload.unit_price_cents,
            });
        }
        ORDER_SHIPPED => {
            state.require_open()?;
            if state.items.is_empty() {
                return Err(DomainError::Validation("cannot ship an empty order".into()));
            }
            let payload: OrderShipped = event.json_data()?;
            state.tracking_number = Some(payload.tracking_number);
            state.status = OrderStatus::Shipped;
        }
        other => return Err(DomainError::InvalidEventType(other.to_owned())),
    }
    Ok(())
}

/// The aggregate root for a customer order.
#[derive(Debug)]
pub struct Order {
    root: AggregateRoot<OrderState>,
}

impl Order {
    /// Creates an empty order handle, ready to be loaded or created.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            root: AggregateRoot::new(id, ORDER_AGGREGATE_TYPE, OrderState::default(), when),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &OrderState {
        self.root.state()
    }

    /// Opens the order for `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the order already exists.
    pub fn create(
        &mut self,
        customer_id: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let payload = OrderCreated {
            customer_id: customer_id.to_owned(),
        };
        self.record(ORDER_CREATED, &payload, correlation_id, clock)
    }

    /// Adds a line item.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the order is not open, the
    /// quantity is zero, or the order total would overflow.
    pub fn add_item(
        &mut self,
        item: LineItem,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let payload = ItemAdded {
            sku: item.sku,
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
        };
        self.record(ITEM_ADDED, &payload, correlation_id, clock)
    }

    /// Ships the order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the order is not open or has no
    /// items.
    pub fn ship(
        &mut self,
        tracking_number: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let payload = OrderShipped {
            tracking_number: tracking_number.to_owned(),
        };
        self.record(ORDER_SHIPPED, &payload, correlation_id, clock)
    }

    fn record<T: Serialize>(
        &mut self,
        event_type: &str,
        payload: &T,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let mut event = Event::new_at(&self.root, event_type, clock);
        event.set_json_data(payload)?;
        let metadata = serde_json::to_vec(&OrderEventMetadata { correlation_id })
            .map_err(MarshalError::from)?;
        event.set_metadata(metadata);
        self.root.add(event)
    }
}

impl Aggregate for Order {
    fn id(&self) -> &str {
        self.root.id()
    }

    fn aggregate_type(&self) -> &str {
        self.root.aggregate_type()
    }

    fn version(&self) -> u64 {
        self.root.version()
    }

    fn events(&self) -> Vec<Event> {
        self.root.events()
    }

    fn add(&mut self, event: Event) -> Result<(), DomainError> {
        self.root.add(event)
    }

    fn load(&mut self, events: &[Event]) -> Result<(), DomainError> {
        self.root.load(events)
    }

    fn has_uncommitted_events(&self) -> bool {
        self.root.has_uncommitted_events()
    }

    fn commit_events(&mut self) {
        self.root.commit_events();
    }
}
