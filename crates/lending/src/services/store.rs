//! Persistence and catalog ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CheckoutId, GearItemId, GearTypeId, MemberId, Version};
use domain::{Checkout, CheckoutStatus, GearItem, GearType};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when reading or writing lending state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A value was saved from a stale version.
    #[error(
        "Concurrency conflict for {aggregate_type} {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: &'static str,
        aggregate_id: Uuid,
        expected: Version,
        actual: Version,
    },

    /// Another catalog item already carries this code.
    #[error("Duplicate item code: {0}")]
    DuplicateCode(String),

    /// Committing would lend more units of a bulk type than exist.
    #[error(
        "Insufficient stock of gear type {gear_type_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        gear_type_id: GearTypeId,
        requested: u32,
        available: u32,
    },

    /// Committing would give a member more open checkouts than allowed.
    #[error("Member {member_id} already holds {open} open checkout(s), limit is {limit}")]
    OpenCheckoutLimit {
        member_id: MemberId,
        open: usize,
        limit: usize,
    },

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true if reloading and reapplying may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Precondition re-checked against stored state inside the atomic write.
///
/// Checks that depend on other checkouts (stock, per-member limits) cannot
/// be protected by a version on the values being written, so the store
/// evaluates them under the same lock as the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitGuard {
    /// Units still out of the type, counting the change set's checkout,
    /// must not exceed `total_quantity`.
    BulkStock {
        gear_type_id: GearTypeId,
        total_quantity: u32,
    },

    /// Open checkouts held by the member, counting the change set's
    /// checkout, must not exceed `limit`.
    OpenCheckoutLimit { member_id: MemberId, limit: usize },
}

/// Values to persist together in a single atomic write.
///
/// Each value carries the version it was loaded at. The write fails as a
/// whole if any stored version has moved on or any guard no longer holds.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub checkout: Option<Checkout>,
    pub items: Vec<GearItem>,
    pub guards: Vec<CommitGuard>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checkout(mut self, checkout: Checkout) -> Self {
        self.checkout = Some(checkout);
        self
    }

    pub fn with_item(mut self, item: GearItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = GearItem>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn with_guard(mut self, guard: CommitGuard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn with_guards(mut self, guards: impl IntoIterator<Item = CommitGuard>) -> Self {
        self.guards.extend(guards);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.checkout.is_none() && self.items.is_empty()
    }
}

/// Values as stored after a successful commit, carrying their new versions.
#[derive(Debug, Clone, Default)]
pub struct Committed {
    pub checkout: Option<Checkout>,
    pub items: Vec<GearItem>,
}

/// Read access to the equipment catalog.
#[async_trait]
pub trait GearCatalog: Send + Sync {
    /// Finds an individually-tracked item by the code on its tag.
    async fn find_item_by_code(&self, code: &str) -> Result<Option<GearItem>>;

    /// Finds an individually-tracked item by id.
    async fn find_item(&self, gear_item_id: GearItemId) -> Result<Option<GearItem>>;

    /// Finds a gear type by id.
    async fn find_gear_type(&self, gear_type_id: GearTypeId) -> Result<Option<GearType>>;
}

/// Storage for checkouts, plus the atomic write shared with the catalog.
#[async_trait]
pub trait CheckoutRepository: Send + Sync {
    /// Loads a checkout by id.
    async fn load_checkout(&self, checkout_id: CheckoutId) -> Result<Option<Checkout>>;

    /// Finds the non-completed checkout holding an unreturned line for the item.
    async fn find_open_checkout_for_item(
        &self,
        gear_item_id: GearItemId,
    ) -> Result<Option<Checkout>>;

    /// Lists a member's checkouts, newest first.
    async fn list_by_member(&self, member_id: MemberId) -> Result<Vec<Checkout>>;

    /// Lists checkouts currently in the given status, newest first.
    async fn list_by_status(&self, status: CheckoutStatus) -> Result<Vec<Checkout>>;

    /// Lists checkouts with at least one line overdue as of the given time.
    async fn list_overdue(&self, as_of: DateTime<Utc>) -> Result<Vec<Checkout>>;

    /// Units of a bulk type still out across all checkouts.
    async fn bulk_outstanding(&self, gear_type_id: GearTypeId) -> Result<u32>;

    /// Persists every value in the change set, or none of them.
    async fn commit(&self, changes: ChangeSet) -> Result<Committed>;
}
