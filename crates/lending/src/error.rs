//! Lending use case error types.

use common::{CheckoutId, GearItemId, GearTypeId, MemberId};
use domain::{CatalogError, CreateError, ItemStatus, ReturnBulkError, ReturnItemError};
use thiserror::Error;

use crate::queries::Ineligibility;
use crate::services::StoreError;

/// Errors that can occur during lending operations.
#[derive(Debug, Error)]
pub enum LendingError {
    /// The checkout request failed validation.
    #[error("Invalid checkout request: {0}")]
    InvalidRequest(#[from] CreateError),

    /// An individual return was rejected by the checkout.
    #[error("Return rejected: {0}")]
    Return(#[from] ReturnItemError),

    /// A bulk return was rejected by the checkout.
    #[error("Bulk return rejected: {0}")]
    BulkReturn(#[from] ReturnBulkError),

    /// A catalog item refused a status transition.
    #[error("Catalog transition rejected: {0}")]
    Catalog(#[from] CatalogError),

    /// No catalog item matches the code or id.
    #[error("Gear item not found: {0}")]
    ItemNotFound(String),

    /// No gear type matches the id.
    #[error("Gear type not found: {0}")]
    GearTypeNotFound(GearTypeId),

    /// A bulk line was requested for an individually-tracked type.
    #[error("Gear type {0} is not bulk-tracked")]
    NotBulkTracked(GearTypeId),

    /// The item is not out on loan.
    #[error("Item {code} is not checked out (status {status})")]
    ItemNotCheckedOut { code: String, status: ItemStatus },

    /// The item cannot be lent in its current status.
    #[error("Item {code} is unavailable (status {status})")]
    ItemUnavailable { code: String, status: ItemStatus },

    /// Not enough un-lent stock of a bulk type.
    #[error(
        "Insufficient stock of gear type {gear_type_id}: requested {requested}, available {available}"
    )]
    InsufficientBulkStock {
        gear_type_id: GearTypeId,
        requested: u32,
        available: u32,
    },

    /// The member may not borrow right now.
    #[error("Member {member_id} is not eligible: {reason}")]
    MemberNotEligible {
        member_id: MemberId,
        reason: Ineligibility,
    },

    /// The checkout accepts no more returns.
    #[error("Checkout {0} is already completed")]
    CheckoutAlreadyCompleted(CheckoutId),

    /// A batch contained no return requests.
    #[error("Batch for checkout {0} has no return requests")]
    EmptyBatch(CheckoutId),

    /// The checkout does not exist.
    #[error("Checkout not found: {0}")]
    CheckoutNotFound(CheckoutId),

    /// The catalog says the item is out but no open checkout holds it.
    #[error("Item {code} ({gear_item_id}) is checked out but no open checkout holds it")]
    OpenCheckoutMissing {
        gear_item_id: GearItemId,
        code: String,
    },

    /// One request in a batch failed; nothing in the batch was persisted.
    #[error("Batch request {index} failed: {source}")]
    BatchRequestFailed {
        index: usize,
        #[source]
        source: Box<LendingError>,
    },

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LendingError {
    /// Returns true if the error means stored data disagrees with itself.
    pub fn is_consistency_error(&self) -> bool {
        match self {
            LendingError::CheckoutNotFound(_) | LendingError::OpenCheckoutMissing { .. } => true,
            LendingError::BatchRequestFailed { source, .. } => source.is_consistency_error(),
            _ => false,
        }
    }

    /// Returns true if the error came from the backing store.
    pub fn is_infrastructure_error(&self) -> bool {
        match self {
            LendingError::Store(_) => true,
            LendingError::BatchRequestFailed { source, .. } => source.is_infrastructure_error(),
            _ => false,
        }
    }

    pub(crate) fn in_batch(self, index: usize) -> Self {
        LendingError::BatchRequestFailed {
            index,
            source: Box::new(self),
        }
    }
}

/// Convenience type alias for lending results.
pub type Result<T> = std::result::Result<T, LendingError>;
