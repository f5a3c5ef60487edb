//! Test handler: records what the dispatcher delivers.

use std::sync::Mutex;

use async_trait::async_trait;
use chronicle_core::dispatcher::EventHandler;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;

/// An event handler that records every event it receives. Optionally fails
/// with a validation error on every call after recording it.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    received: Mutex<Vec<Event>>,
    failure: Option<String>,
}

impl RecordingHandler {
    /// Create a handler that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handler that returns `DomainError::Validation(message)` for
    /// every event.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            received: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    /// Returns a snapshot of the received events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn received(&self) -> Vec<Event> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &Event) -> Result<(), DomainError> {
        self.received.lock().unwrap().push(event.clone());
        match &self.failure {
            Some(message) => Err(DomainError::Validation(message.clone())),
            None => Ok(()),
        }
    }
}
