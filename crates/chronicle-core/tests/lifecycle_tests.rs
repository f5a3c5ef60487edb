//! Aggregate lifecycle across the store and dispatcher boundaries.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use chronicle_core::{
    Aggregate, AggregateRoot, AggregateStore, DomainError, Event, EventDispatcher,
    EventSubscriber, save_and_publish,
};
use chronicle_test_support::{
    FailingAggregateStore, FixedClock, RecordingAggregateStore, RecordingHandler,
};

#[derive(Debug, Default)]
struct Counter {
    value: u32,
}

fn counter(id: &str) -> AggregateRoot<Counter> {
    AggregateRoot::new(id, "Counter", Counter::default(), |state, event| {
        match event.event_type() {
            "Created" => Ok(()),
            "Incremented" => {
                state.value += 1;
                Ok(())
            }
            other => Err(DomainError::InvalidEventType(other.to_owned())),
        }
    })
}

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
}

fn stored(id: &str, types: &[&str]) -> Vec<Event> {
    types
        .iter()
        .zip(1u64..)
        .map(|(t, v)| Event::for_aggregate("Counter", id, *t, &clock()).with_version(v))
        .collect()
}

#[tokio::test]
async fn test_load_from_store_then_add_continues_the_stream() {
    // Arrange
    let store = RecordingAggregateStore::new(stored("c1", &["Created", "Incremented"]));
    let mut aggregate = counter("c1");

    // Act
    store.load_aggregate(&mut aggregate).await.unwrap();
    let event = Event::new_at(&aggregate, "Incremented", &clock());
    aggregate.add(event).unwrap();
    store.save_aggregate(&aggregate).await.unwrap();

    // Assert
    assert_eq!(aggregate.state().value, 2);
    let saved = store.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].aggregate_id, "c1");
    assert_eq!(saved[0].expected_version, 2);
    assert_eq!(saved[0].events.len(), 1);
    assert_eq!(saved[0].events[0].version(), 3);
    assert_eq!(saved[0].events[0].timestamp(), clock().0);
}

#[tokio::test]
async fn test_save_and_publish_commits_then_notifies() {
    // Arrange
    let store = RecordingAggregateStore::new(Vec::new());
    let dispatcher = EventDispatcher::new();
    let handler = Arc::new(RecordingHandler::new());
    dispatcher.subscribe_shared("Incremented", handler.clone());
    let mut aggregate = counter("c1");
    aggregate
        .add(Event::new_at(&aggregate, "Created", &clock()))
        .unwrap();
    aggregate
        .add(Event::new_at(&aggregate, "Incremented", &clock()))
        .unwrap();

    // Act
    let published = save_and_publish(&store, &dispatcher, &mut aggregate)
        .await
        .unwrap();

    // Assert
    assert_eq!(published.len(), 2);
    assert!(!aggregate.has_uncommitted_events());
    assert_eq!(aggregate.global_version(), 2);
    let received = handler.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].version(), 2);
    assert_eq!(received[0].id(), published[1].id());
}

#[tokio::test]
async fn test_save_and_publish_leaves_aggregate_uncommitted_when_save_fails() {
    let dispatcher = EventDispatcher::new();
    let handler = Arc::new(RecordingHandler::new());
    dispatcher.subscribe_shared("Created", handler.clone());
    let mut aggregate = counter("c1");
    aggregate
        .add(Event::new_at(&aggregate, "Created", &clock()))
        .unwrap();

    let result = save_and_publish(&FailingAggregateStore, &dispatcher, &mut aggregate).await;

    assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    assert!(aggregate.has_uncommitted_events());
    assert_eq!(aggregate.global_version(), 0);
    assert!(handler.received().is_empty());
}

#[tokio::test]
async fn test_save_and_publish_reports_handler_error_after_commit() {
    let store = RecordingAggregateStore::new(Vec::new());
    let dispatcher = EventDispatcher::new();
    dispatcher.subscribe_shared("Created", Arc::new(RecordingHandler::failing("projection down")));
    let mut aggregate = counter("c1");
    aggregate
        .add(Event::new_at(&aggregate, "Created", &clock()))
        .unwrap();

    let result = save_and_publish(&store, &dispatcher, &mut aggregate).await;

    match result {
        Err(DomainError::Validation(message)) => assert_eq!(message, "projection down"),
        other => panic!("expected handler error, got {other:?}"),
    }
    assert_eq!(store.saved().len(), 1);
    assert!(!aggregate.has_uncommitted_events());
}

#[tokio::test]
async fn test_save_and_publish_without_changes_does_nothing() {
    let store = RecordingAggregateStore::new(Vec::new());
    let dispatcher = EventDispatcher::new();
    let mut aggregate = counter("c1");

    let published = save_and_publish(&store, &dispatcher, &mut aggregate)
        .await
        .unwrap();

    assert!(published.is_empty());
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn test_publish_returns_handler_error_and_skips_remaining_handlers() {
    // Arrange
    let dispatcher = EventDispatcher::new();
    let first = Arc::new(RecordingHandler::failing("boom"));
    let second = Arc::new(RecordingHandler::new());
    dispatcher.subscribe_shared("Created", first.clone());
    dispatcher.subscribe_shared("Created", second.clone());
    let e1 = Event::for_aggregate("Counter", "c1", "Created", &clock());
    let e2 = Event::for_aggregate("Counter", "c2", "Created", &clock());

    // Act
    let result = dispatcher.publish(&[e1.clone(), e2]).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(ref m)) if m == "boom"));
    let seen = first.received();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].id(), e1.id());
    assert!(second.received().is_empty());
}
