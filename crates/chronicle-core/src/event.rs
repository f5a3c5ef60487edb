//! The event value type.

use chrono::{DateTime, Utc};
use chronicle_marshaling::{Format, MarshalError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::clock::{Clock, SystemClock};

/// An immutable record of one state change of one aggregate.
///
/// Events are created for an aggregate, carry an opaque payload, and receive
/// their version when the owning aggregate records them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    id: Uuid,
    event_type: String,
    data: Vec<u8>,
    timestamp: DateTime<Utc>,
    aggregate_type: String,
    aggregate_id: String,
    version: u64,
    metadata: Vec<u8>,
}

impl Event {
    /// Creates an unversioned event owned by `aggregate`, timestamped now.
    #[must_use]
    pub fn new(aggregate: &dyn Aggregate, event_type: impl Into<String>) -> Self {
        Self::new_at(aggregate, event_type, &SystemClock)
    }

    /// Creates an unversioned event owned by `aggregate`, timestamped by `clock`.
    #[must_use]
    pub fn new_at(
        aggregate: &dyn Aggregate,
        event_type: impl Into<String>,
        clock: &dyn Clock,
    ) -> Self {
        Self::for_aggregate(
            aggregate.aggregate_type(),
            aggregate.id(),
            event_type,
            clock,
        )
    }

    /// Creates an unversioned event for an aggregate known only by type and id.
    #[must_use]
    pub fn for_aggregate(
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            data: Vec::new(),
            timestamp: clock.now(),
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
            version: 0,
            metadata: Vec::new(),
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the event type tag.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Returns the raw payload.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the creation time.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the raw metadata.
    #[must_use]
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Returns the owning aggregate's type tag.
    #[must_use]
    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    /// Returns the owning aggregate's id.
    #[must_use]
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    /// Returns the position of this event in its aggregate's sequence, or 0
    /// if it has not been recorded yet.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replaces the raw payload.
    pub fn set_data(&mut self, data: impl Into<Vec<u8>>) {
        self.data = data.into();
    }

    /// Replaces the raw metadata.
    pub fn set_metadata(&mut self, metadata: impl Into<Vec<u8>>) {
        self.metadata = metadata.into();
    }

    /// Encodes `value` as JSON and stores it as the payload.
    ///
    /// # Errors
    ///
    /// Returns `MarshalError` if `value` cannot be serialized. The payload is
    /// left untouched on failure.
    pub fn set_json_data<T>(&mut self, value: &T) -> Result<(), MarshalError>
    where
        T: Serialize + ?Sized,
    {
        self.set_encoded_data(Format::Json, value)
    }

    /// Decodes the JSON payload into a `T`.
    ///
    /// # Errors
    ///
    /// Returns `MarshalError` if the payload is not valid JSON or does not
    /// match the shape of `T`.
    pub fn json_data<T>(&self) -> Result<T, MarshalError>
    where
        T: DeserializeOwned,
    {
        self.encoded_data(Format::Json)
    }

    /// Encodes `value` in `format` and stores it as the payload.
    ///
    /// # Errors
    ///
    /// Returns `MarshalError` if `value` cannot be serialized.
    pub fn set_encoded_data<T>(&mut self, format: Format, value: &T) -> Result<(), MarshalError>
    where
        T: Serialize + ?Sized,
    {
        self.data = chronicle_marshaling::encode(format, value)?;
        Ok(())
    }

    /// Decodes the payload from `format` into a `T`.
    ///
    /// # Errors
    ///
    /// Returns `MarshalError` if the payload is malformed or mismatched.
    pub fn encoded_data<T>(&self, format: Format) -> Result<T, MarshalError>
    where
        T: DeserializeOwned,
    {
        chronicle_marshaling::decode(format, &self.data)
    }

    /// Builder-style payload setter.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Builder-style metadata setter.
    #[must_use]
    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Restores a persisted event id. Used when rehydrating stored events.
    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Restores a persisted timestamp. Used when rehydrating stored events.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Restores a persisted version. Used when rehydrating stored events for
    /// [`Aggregate::load`]; freshly recorded events get their version from
    /// [`Aggregate::add`].
    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub(crate) fn stamp_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::Deserialize;

    struct FrozenClock(DateTime<Utc>);

    impl Clock for FrozenClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct ItemAdded {
        sku: String,
        quantity: u32,
    }

    fn order_event(event_type: &str) -> Event {
        let clock = FrozenClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        Event::for_aggregate("Order", "a1", event_type, &clock)
    }

    #[test]
    fn test_for_aggregate_sets_identity_and_leaves_version_unset() {
        // Act
        let event = order_event("ItemAdded");

        // Assert
        assert_eq!(event.event_type(), "ItemAdded");
        assert_eq!(event.aggregate_type(), "Order");
        assert_eq!(event.aggregate_id(), "a1");
        assert_eq!(event.version(), 0);
        assert_eq!(
            event.timestamp(),
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
        );
        assert!(event.data().is_empty());
        assert!(event.metadata().is_empty());
    }

    #[test]
    fn test_each_event_gets_a_distinct_id() {
        assert_ne!(order_event("Created").id(), order_event("Created").id());
    }

    #[test]
    fn test_json_payload_round_trips_through_event() {
        // Arrange
        let mut event = order_event("ItemAdded");
        let payload = ItemAdded {
            sku: "sku-1".into(),
            quantity: 3,
        };

        // Act
        event.set_json_data(&payload).unwrap();

        // Assert
        assert_eq!(event.data(), br#"{"sku":"sku-1","quantity":3}"#);
        assert_eq!(event.json_data::<ItemAdded>().unwrap(), payload);
    }

    #[test]
    fn test_json_data_fails_on_invalid_payload() {
        let event = order_event("ItemAdded").with_data(b"not json".to_vec());

        assert!(matches!(
            event.json_data::<ItemAdded>(),
            Err(MarshalError::Json(_))
        ));
    }

    #[test]
    fn test_json_data_fails_on_shape_mismatch() {
        let event = order_event("ItemAdded").with_data(br#"{"sku": 12}"#.to_vec());

        assert!(event.json_data::<ItemAdded>().is_err());
    }

    #[test]
    fn test_yaml_payload_round_trips_through_event() {
        let mut event = order_event("ItemAdded");
        let payload = ItemAdded {
            sku: "sku-9".into(),
            quantity: 1,
        };

        event.set_encoded_data(Format::Yaml, &payload).unwrap();

        assert_eq!(
            event.encoded_data::<ItemAdded>(Format::Yaml).unwrap(),
            payload
        );
    }

    #[test]
    fn test_rehydration_builders_restore_persisted_fields() {
        let id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();

        let event = order_event("Created")
            .with_id(id)
            .with_timestamp(at)
            .with_version(4)
            .with_metadata(br#"{"correlation_id":"c1"}"#.to_vec());

        assert_eq!(event.id(), id);
        assert_eq!(event.timestamp(), at);
        assert_eq!(event.version(), 4);
        assert_eq!(event.metadata(), br#"{"correlation_id":"c1"}"#);
    }
}
