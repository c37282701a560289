//! Checkout aggregate implementation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{CheckoutId, GearItemId, GearTypeId, MemberId, StaffMemberId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::catalog::{CatalogCommand, Condition};

use super::{
    CheckoutDataError, CheckoutLineItem, CheckoutStatus, CreateError, LineKind, LineSpec,
    ReturnBulkError, ReturnItemError,
};

/// Checkout aggregate root.
///
/// One lending transaction: a member borrowing one or more items, processed
/// by a staff member. Lines are fixed at creation and only change through
/// the return operations, each of which returns a new `Checkout`.
///
/// Loading a stored checkout re-checks what `create` and the return
/// operations guarantee; see [`CheckoutDataError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CheckoutRecord")]
pub struct Checkout {
    id: CheckoutId,

    /// Current version for optimistic concurrency.
    version: Version,

    member_id: MemberId,

    /// Staff member who processed the checkout.
    staff_member_id: StaffMemberId,

    /// Lines in insertion order.
    lines: Vec<CheckoutLineItem>,

    notes: Option<String>,
    created_at: DateTime<Utc>,

    /// Set exactly when every line is resolved.
    completed_at: Option<DateTime<Utc>>,
}

/// Stored form of a checkout, checked before it becomes a `Checkout`.
#[derive(Deserialize)]
struct CheckoutRecord {
    id: CheckoutId,
    #[serde(default)]
    version: Version,
    member_id: MemberId,
    staff_member_id: StaffMemberId,
    lines: Vec<CheckoutLineItem>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<CheckoutRecord> for Checkout {
    type Error = CheckoutDataError;

    fn try_from(record: CheckoutRecord) -> Result<Self, Self::Error> {
        let checkout_id = record.id;
        if record.lines.is_empty() {
            return Err(CheckoutDataError::NoLines { checkout_id });
        }

        let mut seen_items = HashSet::new();
        let mut seen_types = HashSet::new();
        for (index, line) in record.lines.iter().enumerate() {
            let fresh = match line.kind() {
                LineKind::Individual { gear_item_id, .. } => seen_items.insert(*gear_item_id),
                LineKind::Bulk { gear_type_id, .. } => seen_types.insert(*gear_type_id),
            };
            if !fresh {
                return Err(CheckoutDataError::DuplicateReference { checkout_id, index });
            }
        }

        let completed = CheckoutStatus::derive(&record.lines).is_terminal();
        if completed != record.completed_at.is_some() {
            return Err(CheckoutDataError::CompletionMismatch { checkout_id });
        }

        Ok(Checkout {
            id: record.id,
            version: record.version,
            member_id: record.member_id,
            staff_member_id: record.staff_member_id,
            lines: record.lines,
            notes: record.notes,
            created_at: record.created_at,
            completed_at: record.completed_at,
        })
    }
}

/// Outcome of returning an individual item: the new checkout and the
/// catalog transition the caller must apply to the physical item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReturn {
    pub checkout: Checkout,
    pub catalog_command: CatalogCommand,
}

impl Aggregate for Checkout {
    type Id = CheckoutId;

    fn aggregate_type() -> &'static str {
        "Checkout"
    }

    fn id(&self) -> CheckoutId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Checkout {
    /// Builds a new checkout with all of its lines.
    ///
    /// Every line starts unreturned, so the checkout starts `Active`.
    pub fn create(
        id: CheckoutId,
        member_id: MemberId,
        staff_member_id: StaffMemberId,
        specs: Vec<LineSpec>,
        notes: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Checkout, CreateError> {
        if specs.is_empty() {
            return Err(CreateError::NoItems);
        }

        let mut seen_items = HashSet::new();
        let mut seen_types = HashSet::new();
        for (index, spec) in specs.iter().enumerate() {
            let fresh = match spec {
                LineSpec::Individual { gear_item_id, .. } => seen_items.insert(*gear_item_id),
                LineSpec::Bulk {
                    gear_type_id,
                    quantity,
                    ..
                } => {
                    if *quantity < 1 {
                        return Err(CreateError::InvalidQuantity {
                            index,
                            quantity: *quantity,
                        });
                    }
                    seen_types.insert(*gear_type_id)
                }
            };
            if !fresh {
                return Err(CreateError::DuplicateReference { index });
            }
        }

        let lines = specs
            .into_iter()
            .map(|spec| CheckoutLineItem::from_spec(spec, created_at))
            .collect();

        Ok(Checkout {
            id,
            version: Version::initial(),
            member_id,
            staff_member_id,
            lines,
            notes,
            created_at,
            completed_at: None,
        })
    }
}

// Query methods
impl Checkout {
    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn staff_member_id(&self) -> StaffMemberId {
        self.staff_member_id
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the current status, derived from line state.
    pub fn status(&self) -> CheckoutStatus {
        CheckoutStatus::derive(&self.lines)
    }

    /// Returns true if every line is resolved.
    pub fn is_completed(&self) -> bool {
        self.status().is_terminal()
    }

    /// Returns all lines in insertion order.
    pub fn lines(&self) -> &[CheckoutLineItem] {
        &self.lines
    }

    /// Returns the line referencing an individual item.
    pub fn line_for_item(&self, gear_item_id: GearItemId) -> Option<&CheckoutLineItem> {
        self.lines
            .iter()
            .find(|line| line.gear_item_id() == Some(gear_item_id))
    }

    /// Returns the line referencing a bulk type.
    pub fn line_for_type(&self, gear_type_id: GearTypeId) -> Option<&CheckoutLineItem> {
        self.lines
            .iter()
            .find(|line| line.gear_type_id() == Some(gear_type_id))
    }

    /// Returns true if the item is on this checkout and not yet returned.
    pub fn holds_item(&self, gear_item_id: GearItemId) -> bool {
        self.line_for_item(gear_item_id)
            .is_some_and(|line| !line.is_resolved())
    }

    /// Units of a bulk type still out on this checkout.
    pub fn outstanding_bulk_quantity(&self, gear_type_id: GearTypeId) -> u32 {
        self.line_for_type(gear_type_id)
            .map_or(0, CheckoutLineItem::remaining_quantity)
    }

    /// All unresolved lines regardless of due date.
    pub fn active_lines(&self) -> Vec<&CheckoutLineItem> {
        self.lines.iter().filter(|line| !line.is_resolved()).collect()
    }

    /// Unresolved lines whose due date is strictly before `as_of`.
    pub fn overdue_lines(&self, as_of: DateTime<Utc>) -> Vec<&CheckoutLineItem> {
        self.lines
            .iter()
            .filter(|line| line.is_overdue(as_of))
            .collect()
    }

    /// Returns true if any unresolved line is past due.
    pub fn is_overdue(&self, as_of: DateTime<Utc>) -> bool {
        self.lines.iter().any(|line| line.is_overdue(as_of))
    }

    /// Largest whole-day overdue count across lines, 0 if nothing is overdue.
    pub fn max_days_overdue(&self, as_of: DateTime<Utc>) -> i64 {
        self.lines
            .iter()
            .filter_map(|line| line.days_overdue(as_of))
            .max()
            .unwrap_or(0)
    }

    /// Catalog transitions needed when this checkout leaves the room.
    pub fn checkout_commands(&self) -> Vec<CatalogCommand> {
        self.lines
            .iter()
            .filter_map(CheckoutLineItem::gear_item_id)
            .map(|gear_item_id| CatalogCommand::MarkCheckedOut { gear_item_id })
            .collect()
    }
}

// Return operations (return new values)
impl Checkout {
    /// Records the return of an individually-tracked item.
    pub fn return_individual_item(
        &self,
        gear_item_id: GearItemId,
        condition: Condition,
        notes: Option<String>,
        as_of: DateTime<Utc>,
    ) -> Result<ItemReturn, ReturnItemError> {
        if self.is_completed() {
            return Err(ReturnItemError::CheckoutCompleted {
                checkout_id: self.id,
            });
        }

        let index = self
            .lines
            .iter()
            .position(|line| line.gear_item_id() == Some(gear_item_id))
            .ok_or(ReturnItemError::ItemNotFound {
                checkout_id: self.id,
                gear_item_id,
            })?;

        let line = &self.lines[index];
        if line.returned_at().is_some() {
            return Err(ReturnItemError::AlreadyReturned {
                checkout_id: self.id,
                gear_item_id,
            });
        }

        let updated = line.with_individual_return(condition, notes, as_of);
        Ok(ItemReturn {
            checkout: self.with_line(index, updated, as_of),
            catalog_command: CatalogCommand::MarkReturned {
                gear_item_id,
                condition,
            },
        })
    }

    /// Records the return of some or all units on a bulk line.
    ///
    /// Zero is rejected along with anything above the remaining quantity.
    pub fn return_bulk_quantity(
        &self,
        gear_type_id: GearTypeId,
        quantity: u32,
        notes: Option<String>,
        as_of: DateTime<Utc>,
    ) -> Result<Checkout, ReturnBulkError> {
        if self.is_completed() {
            return Err(ReturnBulkError::CheckoutCompleted {
                checkout_id: self.id,
            });
        }

        let index = self
            .lines
            .iter()
            .position(|line| line.gear_type_id() == Some(gear_type_id))
            .ok_or(ReturnBulkError::ItemNotFound {
                checkout_id: self.id,
                gear_type_id,
            })?;

        let line = &self.lines[index];
        let remaining = line.remaining_quantity();
        if quantity == 0 || quantity > remaining {
            return Err(ReturnBulkError::InvalidQuantity {
                gear_type_id,
                requested: quantity,
                remaining,
            });
        }

        let updated = line.with_bulk_return(quantity, notes, as_of);
        Ok(self.with_line(index, updated, as_of))
    }

    /// Copies the checkout with one line replaced and completion re-derived.
    fn with_line(&self, index: usize, line: CheckoutLineItem, as_of: DateTime<Utc>) -> Checkout {
        let mut lines = self.lines.clone();
        lines[index] = line;

        let completed_at = CheckoutStatus::derive(&lines)
            .is_terminal()
            .then_some(as_of);

        Checkout {
            lines,
            completed_at,
            notes: self.notes.clone(),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap()
    }

    struct Fixture {
        checkout: Checkout,
        item: GearItemId,
        rope_type: GearTypeId,
    }

    /// One individual line and one bulk line of 2, both due in 3 days.
    fn fixture() -> Fixture {
        let item = GearItemId::new();
        let rope_type = GearTypeId::new();
        let due = t0() + Duration::days(3);
        let checkout = Checkout::create(
            CheckoutId::new(),
            MemberId::new(),
            StaffMemberId::new(),
            vec![
                LineSpec::individual(item, due).with_condition(Condition::Good),
                LineSpec::bulk(rope_type, 2, due),
            ],
            Some("weekend trip".to_string()),
            t0(),
        )
        .unwrap();

        Fixture {
            checkout,
            item,
            rope_type,
        }
    }

    fn assert_completion_invariant(checkout: &Checkout) {
        let all_resolved = checkout.lines().iter().all(CheckoutLineItem::is_resolved);
        assert_eq!(checkout.status() == CheckoutStatus::Completed, all_resolved);
        assert_eq!(checkout.completed_at().is_some(), all_resolved);
    }

    #[test]
    fn test_create_checkout() {
        let f = fixture();
        assert_eq!(f.checkout.status(), CheckoutStatus::Active);
        assert_eq!(f.checkout.lines().len(), 2);
        assert_eq!(f.checkout.completed_at(), None);
        assert_eq!(f.checkout.notes(), Some("weekend trip"));
        assert_eq!(f.checkout.version(), Version::initial());
        assert!(f.checkout.lines().iter().all(|l| l.checked_out_at() == t0()));
        assert!(f.checkout.lines().iter().all(|l| l.returned_quantity() == 0));
    }

    #[test]
    fn test_create_without_items_fails() {
        let result = Checkout::create(
            CheckoutId::new(),
            MemberId::new(),
            StaffMemberId::new(),
            vec![],
            None,
            t0(),
        );
        assert_eq!(result, Err(CreateError::NoItems));
    }

    #[test]
    fn test_create_with_zero_bulk_quantity_fails() {
        let due = t0() + Duration::days(1);
        let result = Checkout::create(
            CheckoutId::new(),
            MemberId::new(),
            StaffMemberId::new(),
            vec![
                LineSpec::individual(GearItemId::new(), due),
                LineSpec::bulk(GearTypeId::new(), 0, due),
            ],
            None,
            t0(),
        );
        assert_eq!(
            result,
            Err(CreateError::InvalidQuantity {
                index: 1,
                quantity: 0
            })
        );
    }

    #[test]
    fn test_create_with_duplicate_reference_fails() {
        let due = t0() + Duration::days(1);
        let item = GearItemId::new();
        let result = Checkout::create(
            CheckoutId::new(),
            MemberId::new(),
            StaffMemberId::new(),
            vec![
                LineSpec::individual(item, due),
                LineSpec::bulk(GearTypeId::new(), 1, due),
                LineSpec::individual(item, due),
            ],
            None,
            t0(),
        );
        assert_eq!(result, Err(CreateError::DuplicateReference { index: 2 }));
    }

    #[test]
    fn test_return_individual_item_partially_returns() {
        let f = fixture();
        let now = t0() + Duration::days(1);

        let ItemReturn {
            checkout,
            catalog_command,
        } = f
            .checkout
            .return_individual_item(f.item, Condition::Good, None, now)
            .unwrap();

        assert_eq!(checkout.status(), CheckoutStatus::PartiallyReturned);
        assert_eq!(checkout.completed_at(), None);
        let line = checkout.line_for_item(f.item).unwrap();
        assert_eq!(line.returned_at(), Some(now));
        assert_eq!(line.condition_at_return(), Some(Condition::Good));
        assert_eq!(checkout.line_for_type(f.rope_type).unwrap().returned_quantity(), 0);
        assert_eq!(
            catalog_command,
            CatalogCommand::MarkReturned {
                gear_item_id: f.item,
                condition: Condition::Good,
            }
        );
        assert_completion_invariant(&checkout);
    }

    #[test]
    fn test_return_does_not_touch_original() {
        let f = fixture();
        let before = f.checkout.clone();

        let _ = f
            .checkout
            .return_individual_item(f.item, Condition::Good, None, t0())
            .unwrap();
        let _ = f
            .checkout
            .return_bulk_quantity(f.rope_type, 2, None, t0())
            .unwrap();

        assert_eq!(f.checkout, before);
    }

    #[test]
    fn test_completing_all_lines_sets_completed_at() {
        let f = fixture();
        let first = t0() + Duration::days(1);
        let last = t0() + Duration::days(2);

        let checkout = f
            .checkout
            .return_individual_item(f.item, Condition::Good, None, first)
            .unwrap()
            .checkout
            .return_bulk_quantity(f.rope_type, 2, None, last)
            .unwrap();

        assert_eq!(checkout.status(), CheckoutStatus::Completed);
        assert_eq!(checkout.completed_at(), Some(last));
        assert_completion_invariant(&checkout);
    }

    #[test]
    fn test_second_individual_return_fails_without_mutation() {
        let f = fixture();
        let once = f
            .checkout
            .return_individual_item(f.item, Condition::Good, None, t0())
            .unwrap()
            .checkout;

        let result = once.return_individual_item(f.item, Condition::Poor, None, t0());

        assert_eq!(
            result,
            Err(ReturnItemError::AlreadyReturned {
                checkout_id: once.id(),
                gear_item_id: f.item,
            })
        );
        assert_eq!(
            once.line_for_item(f.item).unwrap().condition_at_return(),
            Some(Condition::Good)
        );
    }

    #[test]
    fn test_return_unknown_item_fails() {
        let f = fixture();
        let stranger = GearItemId::new();
        let result = f
            .checkout
            .return_individual_item(stranger, Condition::Good, None, t0());
        assert!(matches!(
            result,
            Err(ReturnItemError::ItemNotFound { gear_item_id, .. }) if gear_item_id == stranger
        ));
    }

    #[test]
    fn test_bulk_return_over_remaining_fails() {
        let f = fixture();
        let result = f
            .checkout
            .return_bulk_quantity(f.rope_type, 3, None, t0());
        assert_eq!(
            result,
            Err(ReturnBulkError::InvalidQuantity {
                gear_type_id: f.rope_type,
                requested: 3,
                remaining: 2,
            })
        );
    }

    #[test]
    fn test_bulk_return_of_zero_fails() {
        let f = fixture();
        let result = f
            .checkout
            .return_bulk_quantity(f.rope_type, 0, None, t0());
        assert!(matches!(
            result,
            Err(ReturnBulkError::InvalidQuantity {
                requested: 0,
                remaining: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_bulk_return_unknown_type_fails() {
        let f = fixture();
        let result = f
            .checkout
            .return_bulk_quantity(GearTypeId::new(), 1, None, t0());
        assert!(matches!(result, Err(ReturnBulkError::ItemNotFound { .. })));
    }

    #[test]
    fn test_partial_bulk_returns_accumulate() {
        let due = t0() + Duration::days(7);
        let stakes = GearTypeId::new();
        let checkout = Checkout::create(
            CheckoutId::new(),
            MemberId::new(),
            StaffMemberId::new(),
            vec![LineSpec::bulk(stakes, 5, due)],
            None,
            t0(),
        )
        .unwrap();

        let after_three = checkout
            .return_bulk_quantity(stakes, 3, Some("three back".to_string()), t0())
            .unwrap();
        assert_eq!(after_three.status(), CheckoutStatus::PartiallyReturned);
        assert_eq!(after_three.outstanding_bulk_quantity(stakes), 2);

        let done_at = t0() + Duration::hours(5);
        let after_five = after_three
            .return_bulk_quantity(stakes, 2, None, done_at)
            .unwrap();
        let line = after_five.line_for_type(stakes).unwrap();
        assert_eq!(line.returned_quantity(), 5);
        assert_eq!(line.returned_at(), Some(done_at));
        assert_eq!(line.return_notes(), Some("three back"));
        assert_eq!(after_five.status(), CheckoutStatus::Completed);
        assert_eq!(after_five.completed_at(), Some(done_at));
    }

    #[test]
    fn test_completed_checkout_rejects_every_return() {
        let f = fixture();
        let done = f
            .checkout
            .return_individual_item(f.item, Condition::Good, None, t0())
            .unwrap()
            .checkout
            .return_bulk_quantity(f.rope_type, 2, None, t0())
            .unwrap();
        let id = done.id();

        let completed_item = Err(ReturnItemError::CheckoutCompleted { checkout_id: id });
        let completed_bulk = Err(ReturnBulkError::CheckoutCompleted { checkout_id: id });

        assert_eq!(
            done.return_individual_item(f.item, Condition::Good, None, t0()),
            completed_item
        );
        assert_eq!(
            done.return_individual_item(GearItemId::new(), Condition::Good, None, t0()),
            completed_item
        );
        assert_eq!(
            done.return_bulk_quantity(f.rope_type, 1, None, t0()),
            completed_bulk
        );
        assert_eq!(
            done.return_bulk_quantity(GearTypeId::new(), 1, None, t0()),
            completed_bulk
        );
    }

    #[test]
    fn test_overdue_boundary() {
        let f = fixture();
        let due = t0() + Duration::days(3);

        assert!(!f.checkout.is_overdue(due));
        assert!(f.checkout.overdue_lines(due).is_empty());
        assert_eq!(f.checkout.max_days_overdue(due), 0);

        let just_after = due + Duration::microseconds(1);
        assert!(f.checkout.is_overdue(just_after));
        assert_eq!(f.checkout.overdue_lines(just_after).len(), 2);
        assert_eq!(f.checkout.max_days_overdue(just_after), 0);
    }

    #[test]
    fn test_max_days_overdue_uses_oldest_unresolved_line() {
        let item = GearItemId::new();
        let lamps = GearTypeId::new();
        let checkout = Checkout::create(
            CheckoutId::new(),
            MemberId::new(),
            StaffMemberId::new(),
            vec![
                LineSpec::individual(item, t0() + Duration::days(1)),
                LineSpec::bulk(lamps, 1, t0() + Duration::days(4)),
            ],
            None,
            t0(),
        )
        .unwrap();

        let as_of = t0() + Duration::days(6) + Duration::hours(12);
        assert_eq!(checkout.max_days_overdue(as_of), 5);

        let item_back = checkout
            .return_individual_item(item, Condition::Good, None, as_of)
            .unwrap()
            .checkout;
        assert_eq!(item_back.max_days_overdue(as_of), 2);
        assert_eq!(item_back.active_lines().len(), 1);
    }

    #[test]
    fn test_checkout_commands_cover_individual_lines_only() {
        let f = fixture();
        assert_eq!(
            f.checkout.checkout_commands(),
            vec![CatalogCommand::MarkCheckedOut {
                gear_item_id: f.item
            }]
        );
    }

    #[test]
    fn test_holds_item() {
        let f = fixture();
        assert!(f.checkout.holds_item(f.item));
        let back = f
            .checkout
            .return_individual_item(f.item, Condition::Good, None, t0())
            .unwrap()
            .checkout;
        assert!(!back.holds_item(f.item));
        assert!(!back.holds_item(GearItemId::new()));
    }

    #[test]
    fn test_serialization() {
        let f = fixture();
        let partial = f
            .checkout
            .return_bulk_quantity(f.rope_type, 1, Some("one frayed".to_string()), t0())
            .unwrap();

        let json = serde_json::to_string(&partial).unwrap();
        let deserialized: Checkout = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, partial);
        assert_eq!(deserialized.status(), CheckoutStatus::PartiallyReturned);
    }

    #[test]
    fn test_empty_stored_checkout_rejected() {
        let mut value = serde_json::to_value(fixture().checkout).unwrap();
        value["lines"] = serde_json::json!([]);

        let message = serde_json::from_value::<Checkout>(value)
            .unwrap_err()
            .to_string();
        assert!(message.contains("has no lines"), "{message}");
    }

    #[test]
    fn test_over_returned_stored_line_rejected() {
        let mut value = serde_json::to_value(fixture().checkout).unwrap();
        value["lines"][1]["kind"]["returned_quantity"] = 5.into();

        let message = serde_json::from_value::<Checkout>(value)
            .unwrap_err()
            .to_string();
        assert!(message.contains("exceeds quantity 2"), "{message}");
    }

    #[test]
    fn test_completion_stamp_must_match_lines() {
        let f = fixture();
        let mut value = serde_json::to_value(&f.checkout).unwrap();
        value["completed_at"] = serde_json::to_value(t0()).unwrap();
        assert!(serde_json::from_value::<Checkout>(value).is_err());

        let done = f
            .checkout
            .return_individual_item(f.item, Condition::Good, None, t0())
            .unwrap()
            .checkout
            .return_bulk_quantity(f.rope_type, 2, None, t0())
            .unwrap();
        let mut value = serde_json::to_value(&done).unwrap();
        value["completed_at"] = serde_json::Value::Null;
        assert!(serde_json::from_value::<Checkout>(value).is_err());

        let json = serde_json::to_string(&done).unwrap();
        let loaded: Checkout = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, done);
    }

    #[test]
    fn test_duplicate_stored_lines_rejected() {
        let f = fixture();
        let mut value = serde_json::to_value(&f.checkout).unwrap();
        let first = value["lines"][0].clone();
        value["lines"][1] = first;

        let result = serde_json::from_value::<Checkout>(value);
        assert!(result.unwrap_err().to_string().contains("line 1 duplicates"));
    }

    #[test]
    fn test_missing_version_loads_as_unsaved() {
        let mut value = serde_json::to_value(fixture().checkout).unwrap();
        value.as_object_mut().unwrap().remove("version");
        let loaded: Checkout = serde_json::from_value(value).unwrap();
        assert!(loaded.is_new());
    }
}
