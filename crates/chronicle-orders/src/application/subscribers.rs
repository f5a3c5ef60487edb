//! Event subscribers for the order context.

use std::sync::Arc;

use async_trait::async_trait;
use chronicle_core::dispatcher::{EventHandler, EventSubscriber};
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_logger::Logger;
use serde_json::json;

use crate::domain::events::{ITEM_ADDED, ORDER_CREATED, ORDER_SHIPPED, OrderShipped};

/// Writes an audit record for every order event it receives.
#[derive(Debug, Clone)]
pub struct OrderAuditLog {
    logger: Logger,
}

impl OrderAuditLog {
    /// Creates an audit log writing through `logger`.
    #[must_use]
    pub fn new(logger: &Logger) -> Self {
        Self {
            logger: logger.clone(),
        }
    }

    /// Subscribes one shared audit log to every order event type.
    pub fn subscribe(self, subscriber: &dyn EventSubscriber) {
        let handler: Arc<dyn EventHandler> = Arc::new(self);
        for event_type in [ORDER_CREATED, ITEM_ADDED, ORDER_SHIPPED] {
            subscriber.subscribe_shared(event_type, Arc::clone(&handler));
        }
    }
}

#[async_trait]
impl EventHandler for OrderAuditLog {
    async fn handle(&self, event: &Event) -> Result<(), DomainError> {
        let mut fields = vec![
            ("event_id", json!(event.id().to_string())),
            ("event_type", json!(event.event_type())),
            ("order_id", json!(event.aggregate_id())),
            ("version", json!(event.version())),
        ];
        if event.event_type() == ORDER_SHIPPED {
            let payload: OrderShipped = event.json_data()?;
            fields.push(("tracking_number", json!(payload.tracking_number)));
        }

        self.logger.with_fields(fields).info("order event recorded");
        Ok(())
    }
}
