//! Equipment catalog: gear types and individually-tracked gear items.

mod condition;
mod gear_item;
mod gear_type;

pub use condition::Condition;
pub use gear_item::{GearItem, ItemStatus};
pub use gear_type::{GearType, Tracking};

use common::GearItemId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::Aggregate;

/// Errors that can occur during catalog item transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The item is not in a status that allows the transition.
    #[error("Invalid item transition: cannot {action} item {code} while {status}")]
    InvalidTransition {
        gear_item_id: GearItemId,
        code: String,
        status: ItemStatus,
        action: &'static str,
    },

    /// A catalog command was applied to a different item than it targets.
    #[error("Catalog command for item {expected} applied to item {actual}")]
    CommandTargetMismatch {
        expected: GearItemId,
        actual: GearItemId,
    },
}

/// Status change a checkout operation requires of an individual catalog item.
///
/// Checkout operations never touch catalog items directly; they hand back
/// one of these so the caller can apply it and persist both sides together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogCommand {
    /// The item left the equipment room on a checkout.
    MarkCheckedOut { gear_item_id: GearItemId },

    /// The item came back in the given condition.
    MarkReturned {
        gear_item_id: GearItemId,
        condition: Condition,
    },
}

impl CatalogCommand {
    /// Returns the item this command targets.
    pub fn gear_item_id(&self) -> GearItemId {
        match self {
            CatalogCommand::MarkCheckedOut { gear_item_id }
            | CatalogCommand::MarkReturned { gear_item_id, .. } => *gear_item_id,
        }
    }

    /// Applies the command to the targeted item, returning the updated item.
    pub fn apply_to(&self, item: &GearItem) -> Result<GearItem, CatalogError> {
        if item.id() != self.gear_item_id() {
            return Err(CatalogError::CommandTargetMismatch {
                expected: self.gear_item_id(),
                actual: item.id(),
            });
        }

        match self {
            CatalogCommand::MarkCheckedOut { .. } => item.mark_checked_out(),
            CatalogCommand::MarkReturned { condition, .. } => item.mark_returned(*condition),
        }
    }
}
