//! Checkout aggregate and related types.

mod aggregate;
mod events;
mod line_item;
mod status;

pub use aggregate::{Checkout, ItemReturn};
pub use events::{CheckoutCreatedData, CheckoutEvent, ItemReturnedData, ItemsReturnedData};
pub use line_item::{CheckoutLineItem, LineKind, LineSpec};
pub use status::CheckoutStatus;

use common::{CheckoutId, GearItemId, GearTypeId};
use thiserror::Error;

/// Errors that can occur when building a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    /// A checkout needs at least one line.
    #[error("Checkout has no items")]
    NoItems,

    /// A bulk line asked for fewer than one unit.
    #[error("Invalid quantity on line {index}: {quantity} (must be at least 1)")]
    InvalidQuantity { index: usize, quantity: u32 },

    /// Two lines reference the same item or the same bulk type.
    #[error("Line {index} duplicates an earlier line's reference")]
    DuplicateReference { index: usize },
}

/// Errors that can occur when returning an individually-tracked item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnItemError {
    /// The checkout is already completed and accepts no returns.
    #[error("Checkout {checkout_id} is already completed")]
    CheckoutCompleted { checkout_id: CheckoutId },

    /// No line references the item.
    #[error("Item {gear_item_id} is not on checkout {checkout_id}")]
    ItemNotFound {
        checkout_id: CheckoutId,
        gear_item_id: GearItemId,
    },

    /// The item's line is already resolved.
    #[error("Item {gear_item_id} was already returned on checkout {checkout_id}")]
    AlreadyReturned {
        checkout_id: CheckoutId,
        gear_item_id: GearItemId,
    },
}

/// Errors that can occur when returning a quantity of a bulk type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnBulkError {
    /// The checkout is already completed and accepts no returns.
    #[error("Checkout {checkout_id} is already completed")]
    CheckoutCompleted { checkout_id: CheckoutId },

    /// No line references the gear type.
    #[error("Gear type {gear_type_id} is not on checkout {checkout_id}")]
    ItemNotFound {
        checkout_id: CheckoutId,
        gear_type_id: GearTypeId,
    },

    /// The requested quantity is zero or exceeds what is still out.
    #[error(
        "Invalid return quantity for gear type {gear_type_id}: requested {requested}, remaining {remaining}"
    )]
    InvalidQuantity {
        gear_type_id: GearTypeId,
        requested: u32,
        remaining: u32,
    },
}

/// A stored line whose return state contradicts itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineDataError {
    #[error("bulk line quantity must be at least 1")]
    ZeroQuantity,

    #[error("returned quantity {returned_quantity} exceeds quantity {quantity}")]
    OverReturned { quantity: u32, returned_quantity: u32 },

    #[error("returned_at must be set exactly when the line is resolved")]
    ReturnStampMismatch,
}

/// A stored checkout that breaks the invariants `Checkout::create` and the
/// return operations maintain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutDataError {
    #[error("Stored checkout {checkout_id} has no lines")]
    NoLines { checkout_id: CheckoutId },

    #[error("Stored checkout {checkout_id}: line {index} duplicates an earlier line's reference")]
    DuplicateReference { checkout_id: CheckoutId, index: usize },

    #[error("Stored checkout {checkout_id}: completed_at does not match line resolution")]
    CompletionMismatch { checkout_id: CheckoutId },
}
