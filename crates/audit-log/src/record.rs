use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::Version;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuditError, Result};

/// Unique identifier for an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An audit record describing one persisted change.
///
/// Wraps a domain event payload with the metadata needed to store and
/// filter it independently of the aggregate it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier for this record.
    pub event_id: EventId,

    /// The type of the event (e.g., "CheckoutCreated", "ItemReturned").
    pub event_type: String,

    /// The aggregate the change was applied to.
    pub aggregate_id: Uuid,

    /// The type of aggregate (e.g., "Checkout").
    pub aggregate_type: String,

    /// The stored version of the aggregate after the change.
    pub version: Version,

    /// When the change took effect.
    pub timestamp: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// Additional metadata (e.g., the staff member who processed the change).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AuditRecord {
    /// Creates a new audit record builder.
    pub fn builder() -> AuditRecordBuilder {
        AuditRecordBuilder::default()
    }

    /// Deserializes the payload into a concrete event type.
    pub fn decode_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Builder for constructing audit records.
#[derive(Debug, Default)]
pub struct AuditRecordBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    aggregate_id: Option<Uuid>,
    aggregate_type: Option<String>,
    version: Option<Version>,
    timestamp: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl AuditRecordBuilder {
    /// Sets the event ID. If not set, a new ID will be generated.
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Sets the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the aggregate ID.
    pub fn aggregate_id(mut self, id: impl Into<Uuid>) -> Self {
        self.aggregate_id = Some(id.into());
        self
    }

    /// Sets the aggregate type.
    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    /// Sets the aggregate version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the timestamp. If not set, the current time will be used.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the record, failing if a required field is missing.
    ///
    /// Required fields: event_type, aggregate_id, aggregate_type, version, payload.
    pub fn build(self) -> Result<AuditRecord> {
        Ok(AuditRecord {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self.event_type.ok_or(AuditError::Incomplete("event_type"))?,
            aggregate_id: self
                .aggregate_id
                .ok_or(AuditError::Incomplete("aggregate_id"))?,
            aggregate_type: self
                .aggregate_type
                .ok_or(AuditError::Incomplete("aggregate_type"))?,
            version: self.version.ok_or(AuditError::Incomplete("version"))?,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload: self.payload.ok_or(AuditError::Incomplete("payload"))?,
            metadata: self.metadata,
        })
    }
}
