use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::AuditRecord;

/// Filter for reading back audit records.
///
/// All set criteria must match; unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Filter by aggregate ID.
    pub aggregate_id: Option<Uuid>,

    /// Filter by event types (any of these types).
    pub event_types: Option<Vec<String>>,

    /// Filter by records at or after this timestamp.
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Filter by records at or before this timestamp.
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Maximum number of records to return.
    pub limit: Option<usize>,

    /// Number of records to skip.
    pub offset: Option<usize>,
}

impl AuditQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a specific aggregate.
    pub fn for_aggregate(aggregate_id: impl Into<Uuid>) -> Self {
        Self {
            aggregate_id: Some(aggregate_id.into()),
            ..Default::default()
        }
    }

    /// Creates a query for records of a specific type.
    pub fn for_event_type(event_type: impl Into<String>) -> Self {
        Self {
            event_types: Some(vec![event_type.into()]),
            ..Default::default()
        }
    }

    /// Filters by aggregate ID.
    pub fn aggregate_id(mut self, id: impl Into<Uuid>) -> Self {
        self.aggregate_id = Some(id.into());
        self
    }

    /// Filters by event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types = Some(vec![event_type.into()]);
        self
    }

    /// Filters to records at or after this timestamp.
    pub fn from_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(timestamp);
        self
    }

    /// Filters to records at or before this timestamp.
    pub fn to_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(timestamp);
        self
    }

    /// Limits the number of records returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many records before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the record satisfies every set criterion.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(id) = self.aggregate_id
            && record.aggregate_id != id
        {
            return false;
        }
        if let Some(ref types) = self.event_types
            && !types.contains(&record.event_type)
        {
            return false;
        }
        if let Some(from) = self.from_timestamp
            && record.timestamp < from
        {
            return false;
        }
        if let Some(to) = self.to_timestamp
            && record.timestamp > to
        {
            return false;
        }
        true
    }
}
