use chrono::{DateTime, Duration, Utc};
use common::GearTypeId;
use serde::{Deserialize, Serialize};

/// How units of a gear type are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Tracking {
    /// One catalog record per physical unit, each with its own code.
    Individual,

    /// Counted by quantity only, no per-unit identity.
    Bulk { total_quantity: u32 },
}

/// A kind of equipment in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearType {
    id: GearTypeId,
    name: String,
    checkout_duration_days: u32,
    tracking: Tracking,
}

impl GearType {
    /// Creates an individually-tracked gear type.
    pub fn individual(name: impl Into<String>, checkout_duration_days: u32) -> Self {
        Self {
            id: GearTypeId::new(),
            name: name.into(),
            checkout_duration_days,
            tracking: Tracking::Individual,
        }
    }

    /// Creates a bulk-tracked gear type with a total stock count.
    pub fn bulk(name: impl Into<String>, checkout_duration_days: u32, total_quantity: u32) -> Self {
        Self {
            id: GearTypeId::new(),
            name: name.into(),
            checkout_duration_days,
            tracking: Tracking::Bulk { total_quantity },
        }
    }

    pub fn id(&self) -> GearTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checkout_duration_days(&self) -> u32 {
        self.checkout_duration_days
    }

    pub fn tracking(&self) -> Tracking {
        self.tracking
    }

    /// Returns true if the type is counted by quantity.
    pub fn is_bulk(&self) -> bool {
        matches!(self.tracking, Tracking::Bulk { .. })
    }

    /// Returns the total stock for bulk types, None for individual types.
    pub fn total_quantity(&self) -> Option<u32> {
        match self.tracking {
            Tracking::Bulk { total_quantity } => Some(total_quantity),
            Tracking::Individual => None,
        }
    }

    /// Computes the due date of a line checked out at the given time.
    pub fn due_at(&self, checked_out_at: DateTime<Utc>) -> DateTime<Utc> {
        checked_out_at + Duration::days(i64::from(self.checkout_duration_days))
    }
}
