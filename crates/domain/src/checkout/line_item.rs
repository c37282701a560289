//! Checkout line items.

use chrono::{DateTime, Utc};
use common::{GearItemId, GearTypeId};
use serde::{Deserialize, Serialize};

use crate::catalog::Condition;

use super::LineDataError;

/// Seconds in one overdue day.
const SECONDS_PER_DAY: i64 = 86_400;

/// What a line item references, with the return state specific to that mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LineKind {
    /// A single physical item.
    Individual {
        gear_item_id: GearItemId,
        condition_at_checkout: Option<Condition>,
        condition_at_return: Option<Condition>,
    },

    /// A quantity of a bulk-tracked type.
    Bulk {
        gear_type_id: GearTypeId,
        quantity: u32,
        returned_quantity: u32,
    },
}

/// Input describing one line of a checkout being created.
///
/// The due date is resolved by the caller from the gear type's checkout
/// duration before the checkout is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineSpec {
    Individual {
        gear_item_id: GearItemId,
        due_at: DateTime<Utc>,
        condition_at_checkout: Option<Condition>,
    },
    Bulk {
        gear_type_id: GearTypeId,
        quantity: u32,
        due_at: DateTime<Utc>,
    },
}

impl LineSpec {
    /// Creates a spec for a single item.
    pub fn individual(gear_item_id: GearItemId, due_at: DateTime<Utc>) -> Self {
        LineSpec::Individual {
            gear_item_id,
            due_at,
            condition_at_checkout: None,
        }
    }

    /// Creates a spec for a bulk quantity.
    pub fn bulk(gear_type_id: GearTypeId, quantity: u32, due_at: DateTime<Utc>) -> Self {
        LineSpec::Bulk {
            gear_type_id,
            quantity,
            due_at,
        }
    }

    /// Records the item's condition as it leaves the room. No effect on bulk specs.
    pub fn with_condition(self, condition: Condition) -> Self {
        match self {
            LineSpec::Individual {
                gear_item_id,
                due_at,
                ..
            } => LineSpec::Individual {
                gear_item_id,
                due_at,
                condition_at_checkout: Some(condition),
            },
            bulk @ LineSpec::Bulk { .. } => bulk,
        }
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        match self {
            LineSpec::Individual { due_at, .. } | LineSpec::Bulk { due_at, .. } => *due_at,
        }
    }
}

/// One entry in a checkout.
///
/// Deserialization rejects lines whose return state contradicts itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineRecord")]
pub struct CheckoutLineItem {
    kind: LineKind,
    checked_out_at: DateTime<Utc>,
    due_at: DateTime<Utc>,

    /// Set once the line is fully resolved.
    returned_at: Option<DateTime<Utc>>,

    /// Latest return note; partial returns overwrite earlier notes.
    return_notes: Option<String>,
}

/// Stored form of a line, checked before it becomes a `CheckoutLineItem`.
#[derive(Deserialize)]
struct LineRecord {
    kind: LineKind,
    checked_out_at: DateTime<Utc>,
    due_at: DateTime<Utc>,
    returned_at: Option<DateTime<Utc>>,
    return_notes: Option<String>,
}

impl TryFrom<LineRecord> for CheckoutLineItem {
    type Error = LineDataError;

    fn try_from(record: LineRecord) -> Result<Self, Self::Error> {
        let resolved = match record.kind {
            LineKind::Individual {
                condition_at_return,
                ..
            } => condition_at_return.is_some(),
            LineKind::Bulk {
                quantity,
                returned_quantity,
                ..
            } => {
                if quantity == 0 {
                    return Err(LineDataError::ZeroQuantity);
                }
                if returned_quantity > quantity {
                    return Err(LineDataError::OverReturned {
                        quantity,
                        returned_quantity,
                    });
                }
                returned_quantity == quantity
            }
        };
        if resolved != record.returned_at.is_some() {
            return Err(LineDataError::ReturnStampMismatch);
        }

        Ok(Self {
            kind: record.kind,
            checked_out_at: record.checked_out_at,
            due_at: record.due_at,
            returned_at: record.returned_at,
            return_notes: record.return_notes,
        })
    }
}

impl CheckoutLineItem {
    pub(crate) fn from_spec(spec: LineSpec, checked_out_at: DateTime<Utc>) -> Self {
        let due_at = spec.due_at();
        let kind = match spec {
            LineSpec::Individual {
                gear_item_id,
                condition_at_checkout,
                ..
            } => LineKind::Individual {
                gear_item_id,
                condition_at_checkout,
                condition_at_return: None,
            },
            LineSpec::Bulk {
                gear_type_id,
                quantity,
                ..
            } => LineKind::Bulk {
                gear_type_id,
                quantity,
                returned_quantity: 0,
            },
        };

        Self {
            kind,
            checked_out_at,
            due_at,
            returned_at: None,
            return_notes: None,
        }
    }

    pub fn kind(&self) -> &LineKind {
        &self.kind
    }

    /// Returns the referenced item for individual lines.
    pub fn gear_item_id(&self) -> Option<GearItemId> {
        match self.kind {
            LineKind::Individual { gear_item_id, .. } => Some(gear_item_id),
            LineKind::Bulk { .. } => None,
        }
    }

    /// Returns the referenced type for bulk lines.
    pub fn gear_type_id(&self) -> Option<GearTypeId> {
        match self.kind {
            LineKind::Bulk { gear_type_id, .. } => Some(gear_type_id),
            LineKind::Individual { .. } => None,
        }
    }

    /// Units on this line: 1 for individual lines.
    pub fn quantity(&self) -> u32 {
        match self.kind {
            LineKind::Individual { .. } => 1,
            LineKind::Bulk { quantity, .. } => quantity,
        }
    }

    /// Units already back in the room.
    pub fn returned_quantity(&self) -> u32 {
        match self.kind {
            LineKind::Individual { .. } => u32::from(self.returned_at.is_some()),
            LineKind::Bulk {
                returned_quantity, ..
            } => returned_quantity,
        }
    }

    /// Units still out.
    pub fn remaining_quantity(&self) -> u32 {
        self.quantity().saturating_sub(self.returned_quantity())
    }

    pub fn checked_out_at(&self) -> DateTime<Utc> {
        self.checked_out_at
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn return_notes(&self) -> Option<&str> {
        self.return_notes.as_deref()
    }

    pub fn condition_at_checkout(&self) -> Option<Condition> {
        match self.kind {
            LineKind::Individual {
                condition_at_checkout,
                ..
            } => condition_at_checkout,
            LineKind::Bulk { .. } => None,
        }
    }

    pub fn condition_at_return(&self) -> Option<Condition> {
        match self.kind {
            LineKind::Individual {
                condition_at_return,
                ..
            } => condition_at_return,
            LineKind::Bulk { .. } => None,
        }
    }

    /// Returns true once nothing on this line is still out.
    pub fn is_resolved(&self) -> bool {
        match self.kind {
            LineKind::Individual { .. } => self.returned_at.is_some(),
            LineKind::Bulk {
                quantity,
                returned_quantity,
                ..
            } => returned_quantity >= quantity,
        }
    }

    /// Returns true if any part of this line has come back.
    pub fn has_return_progress(&self) -> bool {
        self.returned_quantity() > 0
    }

    /// Returns true if the line is unresolved and its due date is strictly before `as_of`.
    pub fn is_overdue(&self, as_of: DateTime<Utc>) -> bool {
        !self.is_resolved() && self.due_at < as_of
    }

    /// Whole days past due, floored. None if the line is not overdue.
    pub fn days_overdue(&self, as_of: DateTime<Utc>) -> Option<i64> {
        if !self.is_overdue(as_of) {
            return None;
        }
        let seconds = (as_of - self.due_at).num_seconds();
        Some(seconds.div_euclid(SECONDS_PER_DAY))
    }

    pub(crate) fn with_individual_return(
        &self,
        condition: Condition,
        notes: Option<String>,
        as_of: DateTime<Utc>,
    ) -> Self {
        let kind = match &self.kind {
            LineKind::Individual {
                gear_item_id,
                condition_at_checkout,
                ..
            } => LineKind::Individual {
                gear_item_id: *gear_item_id,
                condition_at_checkout: *condition_at_checkout,
                condition_at_return: Some(condition),
            },
            bulk @ LineKind::Bulk { .. } => bulk.clone(),
        };

        Self {
            kind,
            returned_at: Some(as_of),
            return_notes: notes,
            ..self.clone()
        }
    }

    /// Caller must have checked `quantity <= remaining_quantity()`.
    pub(crate) fn with_bulk_return(
        &self,
        quantity: u32,
        notes: Option<String>,
        as_of: DateTime<Utc>,
    ) -> Self {
        debug_assert!(quantity <= self.remaining_quantity());

        let mut next = self.clone();
        if let LineKind::Bulk {
            returned_quantity, ..
        } = &mut next.kind
        {
            *returned_quantity += quantity;
        }
        if next.is_resolved() {
            next.returned_at = Some(as_of);
        }
        if notes.is_some() {
            next.return_notes = notes;
        }
        next
    }
}
