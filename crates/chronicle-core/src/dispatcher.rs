//! In-process publish/subscribe routing of events by type.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::DomainError;
use crate::event::Event;

/// Something that reacts to published events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Any error aborts the publish call that invoked this handler.
    async fn handle(&self, event: &Event) -> Result<(), DomainError>;
}

/// Registers handlers by event type.
pub trait EventSubscriber: Send + Sync {
    /// Appends `handler` to the handlers for `event_type`.
    fn subscribe_shared(&self, event_type: &str, handler: Arc<dyn EventHandler>);
}

/// Delivers events to whoever is interested.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes `events` in order.
    ///
    /// # Errors
    ///
    /// Returns the first handler error; later handlers and events are skipped.
    async fn publish(&self, events: &[Event]) -> Result<(), DomainError>;
}

/// Adapter turning an async closure into an [`EventHandler`].
pub struct HandlerFn<F>(F);

/// Wraps `f` as an [`EventHandler`]. The closure receives its own copy of the
/// event.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), DomainError>> + Send,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> EventHandler for HandlerFn<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), DomainError>> + Send,
{
    async fn handle(&self, event: &Event) -> Result<(), DomainError> {
        (self.0)(event.clone()).await
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerFn")
    }
}

type HandlerList = Vec<Arc<dyn EventHandler>>;

/// Synchronous in-memory event router.
///
/// Handlers run one after another on the publishing task, in subscription
/// order. Each event's handler list is snapshotted before invocation, so a
/// handler may subscribe further handlers without deadlocking; those take
/// effect from the next event on.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Mutex<HashMap<String, HandlerList>>,
}

impl EventDispatcher {
    /// Creates a dispatcher with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the handlers for `event_type`.
    pub fn subscribe<H>(&self, event_type: impl Into<String>, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.register(event_type.into(), Arc::new(handler));
    }

    /// Returns how many handlers are registered for `event_type`.
    #[must_use]
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.lock().get(event_type).map_or(0, Vec::len)
    }

    /// Invokes every handler registered for each event's type.
    ///
    /// # Errors
    ///
    /// Returns the first handler error verbatim. Handlers that already ran
    /// keep their side effects; nothing after the failing handler runs.
    pub async fn publish(&self, events: &[Event]) -> Result<(), DomainError> {
        for event in events {
            let handlers = self.snapshot(event.event_type());
            debug!(
                event_id = %event.id(),
                event_type = event.event_type(),
                aggregate_id = event.aggregate_id(),
                handlers = handlers.len(),
                "dispatching event"
            );

            for handler in handlers {
                handler.handle(event).await?;
            }
        }
        Ok(())
    }

    fn register(&self, event_type: String, handler: Arc<dyn EventHandler>) {
        debug!(event_type = %event_type, "subscribing event handler");
        self.lock().entry(event_type).or_default().push(handler);
    }

    fn snapshot(&self, event_type: &str) -> HandlerList {
        self.lock().get(event_type).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, HandlerList>> {
        // Handlers never run under this lock.
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSubscriber for EventDispatcher {
    fn subscribe_shared(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.register(event_type.to_owned(), handler);
    }
}

#[async_trait]
impl EventPublisher for EventDispatcher {
    async fn publish(&self, events: &[Event]) -> Result<(), DomainError> {
        EventDispatcher::publish(self, events).await
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        let mut counts: Vec<(&str, usize)> = registry
            .iter()
            .map(|(event_type, handlers)| (event_type.as_str(), handlers.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventDispatcher")
            .field("handlers", &counts)
            .finish()
    }
}
