//! Checkout domain events.

use chrono::{DateTime, Utc};
use common::{CheckoutId, GearItemId, MemberId, StaffMemberId};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::catalog::{Condition, GearItem, ItemStatus};

use super::{Checkout, CheckoutLineItem};

/// Events published when a checkout changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CheckoutEvent {
    /// A checkout was created and its items left the room.
    CheckoutCreated(CheckoutCreatedData),

    /// A single item came back through a quick return.
    ItemReturned(ItemReturnedData),

    /// A batch of returns was reconciled against one checkout.
    ItemsReturned(ItemsReturnedData),
}

impl DomainEvent for CheckoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CheckoutEvent::CheckoutCreated(_) => "CheckoutCreated",
            CheckoutEvent::ItemReturned(_) => "ItemReturned",
            CheckoutEvent::ItemsReturned(_) => "ItemsReturned",
        }
    }
}

/// Data for CheckoutCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutCreatedData {
    pub checkout_id: CheckoutId,
    pub member_id: MemberId,
    pub staff_member_id: StaffMemberId,

    /// Number of lines on the checkout.
    pub line_count: usize,

    /// Individually-tracked items that were lent.
    pub individual_item_ids: Vec<GearItemId>,

    /// Total units across bulk lines.
    pub bulk_units: u32,

    pub created_at: DateTime<Utc>,
}

/// Data for ItemReturned event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReturnedData {
    pub checkout_id: CheckoutId,
    pub gear_item_id: GearItemId,

    /// Code on the item's tag.
    pub code: String,

    /// Condition recorded at return.
    pub condition: Condition,

    /// True if the item went to maintenance instead of back on the shelf.
    pub routed_to_maintenance: bool,

    /// True if this return completed the checkout.
    pub checkout_completed: bool,

    pub returned_at: DateTime<Utc>,
}

/// Data for ItemsReturned event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsReturnedData {
    pub checkout_id: CheckoutId,

    /// Number of return requests in the batch.
    pub request_count: usize,

    /// Individual items returned by the batch.
    pub items_returned: usize,

    /// Bulk units returned by the batch.
    pub bulk_units_returned: u32,

    /// True if the batch completed the checkout.
    pub checkout_completed: bool,

    pub returned_at: DateTime<Utc>,
}

// Convenience constructors for events
impl CheckoutEvent {
    /// Creates a CheckoutCreated event.
    pub fn checkout_created(checkout: &Checkout) -> Self {
        let lines = checkout.lines();
        CheckoutEvent::CheckoutCreated(CheckoutCreatedData {
            checkout_id: checkout.id(),
            member_id: checkout.member_id(),
            staff_member_id: checkout.staff_member_id(),
            line_count: lines.len(),
            individual_item_ids: lines
                .iter()
                .filter_map(CheckoutLineItem::gear_item_id)
                .collect(),
            bulk_units: lines
                .iter()
                .filter(|line| line.gear_type_id().is_some())
                .map(CheckoutLineItem::quantity)
                .sum(),
            created_at: checkout.created_at(),
        })
    }

    /// Creates an ItemReturned event from the checkout and item after the return.
    pub fn item_returned(checkout: &Checkout, item: &GearItem, returned_at: DateTime<Utc>) -> Self {
        CheckoutEvent::ItemReturned(ItemReturnedData {
            checkout_id: checkout.id(),
            gear_item_id: item.id(),
            code: item.code().to_string(),
            condition: item.condition(),
            routed_to_maintenance: item.status() == ItemStatus::Maintenance,
            checkout_completed: checkout.is_completed(),
            returned_at,
        })
    }

    /// Creates an ItemsReturned event summarising a batch.
    pub fn items_returned(
        checkout: &Checkout,
        request_count: usize,
        items_returned: usize,
        bulk_units_returned: u32,
        returned_at: DateTime<Utc>,
    ) -> Self {
        CheckoutEvent::ItemsReturned(ItemsReturnedData {
            checkout_id: checkout.id(),
            request_count,
            items_returned,
            bulk_units_returned,
            checkout_completed: checkout.is_completed(),
            returned_at,
        })
    }

    /// Returns the checkout this event belongs to.
    pub fn checkout_id(&self) -> CheckoutId {
        match self {
            CheckoutEvent::CheckoutCreated(data) => data.checkout_id,
            CheckoutEvent::ItemReturned(data) => data.checkout_id,
            CheckoutEvent::ItemsReturned(data) => data.checkout_id,
        }
    }
}
