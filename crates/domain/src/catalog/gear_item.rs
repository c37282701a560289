use common::{GearItemId, GearTypeId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{CatalogError, Condition};

/// Availability status of an individually-tracked item.
///
/// State transitions:
/// ```text
/// Available ──► CheckedOut ──┬──► Available
///     ▲                      └──► Maintenance (returned NEEDS_REPAIR)
///     └───────── Maintenance ◄┘
///
/// Available | Maintenance ──► Retired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// On the shelf and lendable.
    #[default]
    Available,

    /// Out on a checkout.
    CheckedOut,

    /// Pulled for repair.
    Maintenance,

    /// Permanently removed from circulation (terminal state).
    Retired,
}

impl ItemStatus {
    /// Returns true if the item can be lent in this status.
    pub fn can_check_out(&self) -> bool {
        matches!(self, ItemStatus::Available)
    }

    /// Returns true if a return can be recorded in this status.
    pub fn can_return(&self) -> bool {
        matches!(self, ItemStatus::CheckedOut)
    }

    /// Returns true if maintenance can be signed off in this status.
    pub fn can_complete_maintenance(&self) -> bool {
        matches!(self, ItemStatus::Maintenance)
    }

    /// Returns true if the item can be retired in this status.
    pub fn can_retire(&self) -> bool {
        matches!(self, ItemStatus::Available | ItemStatus::Maintenance)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "AVAILABLE",
            ItemStatus::CheckedOut => "CHECKED_OUT",
            ItemStatus::Maintenance => "MAINTENANCE",
            ItemStatus::Retired => "RETIRED",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One physical, individually-tracked unit of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearItem {
    id: GearItemId,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    gear_type_id: GearTypeId,

    /// Unique code printed on the item's tag (barcode/NFC).
    code: String,

    condition: Condition,
    status: ItemStatus,
}

impl Aggregate for GearItem {
    type Id = GearItemId;

    fn aggregate_type() -> &'static str {
        "GearItem"
    }

    fn id(&self) -> GearItemId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

// Query methods
impl GearItem {
    /// Creates a new available item.
    pub fn new(gear_type_id: GearTypeId, code: impl Into<String>, condition: Condition) -> Self {
        Self {
            id: GearItemId::new(),
            version: Version::initial(),
            gear_type_id,
            code: code.into(),
            condition,
            status: ItemStatus::Available,
        }
    }

    pub fn gear_type_id(&self) -> GearTypeId {
        self.gear_type_id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Returns true if the item can be lent right now.
    pub fn is_available(&self) -> bool {
        self.status.can_check_out()
    }
}

// Transitions (return a new value)
impl GearItem {
    /// Marks the item as lent out.
    pub fn mark_checked_out(&self) -> Result<GearItem, CatalogError> {
        if !self.status.can_check_out() {
            return Err(self.invalid_transition("check out"));
        }

        Ok(self.with_status(ItemStatus::CheckedOut, self.condition))
    }

    /// Records the item's return in the given condition.
    ///
    /// An item returned as `NeedsRepair` goes to maintenance instead of
    /// back on the shelf.
    pub fn mark_returned(&self, condition: Condition) -> Result<GearItem, CatalogError> {
        if !self.status.can_return() {
            return Err(self.invalid_transition("return"));
        }

        let status = if condition.needs_repair() {
            ItemStatus::Maintenance
        } else {
            ItemStatus::Available
        };
        Ok(self.with_status(status, condition))
    }

    /// Signs off a repair, putting the item back on the shelf in the given condition.
    pub fn complete_maintenance(&self, condition: Condition) -> Result<GearItem, CatalogError> {
        if !self.status.can_complete_maintenance() || condition.needs_repair() {
            return Err(self.invalid_transition("complete maintenance for"));
        }

        Ok(self.with_status(ItemStatus::Available, condition))
    }

    /// Permanently removes the item from circulation.
    pub fn retire(&self) -> Result<GearItem, CatalogError> {
        if !self.status.can_retire() {
            return Err(self.invalid_transition("retire"));
        }

        Ok(self.with_status(ItemStatus::Retired, self.condition))
    }

    fn with_status(&self, status: ItemStatus, condition: Condition) -> GearItem {
        GearItem {
            status,
            condition,
            ..self.clone()
        }
    }

    fn invalid_transition(&self, action: &'static str) -> CatalogError {
        CatalogError::InvalidTransition {
            gear_item_id: self.id,
            code: self.code.clone(),
            status: self.status,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> GearItem {
        GearItem::new(GearTypeId::new(), "KAYAK-07", Condition::Good)
    }

    #[test]
    fn test_new_item_is_available() {
        let item = item();
        assert!(item.is_available());
        assert_eq!(item.code(), "KAYAK-07");
        assert!(item.is_new());
    }

    #[test]
    fn test_check_out_and_return_good() {
        let out = item().mark_checked_out().unwrap();
        assert_eq!(out.status(), ItemStatus::CheckedOut);

        let back = out.mark_returned(Condition::Fair).unwrap();
        assert_eq!(back.status(), ItemStatus::Available);
        assert_eq!(back.condition(), Condition::Fair);
    }

    #[test]
    fn test_return_needing_repair_routes_to_maintenance() {
        let out = item().mark_checked_out().unwrap();
        let back = out.mark_returned(Condition::NeedsRepair).unwrap();

        assert_eq!(back.status(), ItemStatus::Maintenance);
        assert_eq!(back.condition(), Condition::NeedsRepair);
        assert!(!back.is_available());
    }

    #[test]
    fn test_transitions_leave_original_untouched() {
        let original = item();
        let _ = original.mark_checked_out().unwrap();
        assert_eq!(original.status(), ItemStatus::Available);
    }

    #[test]
    fn test_cannot_check_out_twice() {
        let out = item().mark_checked_out().unwrap();
        let result = out.mark_checked_out();
        assert!(matches!(
            result,
            Err(CatalogError::InvalidTransition {
                status: ItemStatus::CheckedOut,
                action: "check out",
                ..
            })
        ));
    }

    #[test]
    fn test_cannot_return_item_on_shelf() {
        let result = item().mark_returned(Condition::Good);
        assert!(matches!(
            result,
            Err(CatalogError::InvalidTransition {
                status: ItemStatus::Available,
                ..
            })
        ));
    }

    #[test]
    fn test_maintenance_cycle() {
        let in_repair = item()
            .mark_checked_out()
            .unwrap()
            .mark_returned(Condition::NeedsRepair)
            .unwrap();

        assert!(in_repair.complete_maintenance(Condition::NeedsRepair).is_err());

        let fixed = in_repair.complete_maintenance(Condition::Good).unwrap();
        assert_eq!(fixed.status(), ItemStatus::Available);
        assert_eq!(fixed.condition(), Condition::Good);
    }

    #[test]
    fn test_retire() {
        let retired = item().retire().unwrap();
        assert_eq!(retired.status(), ItemStatus::Retired);
        assert!(retired.retire().is_err());
        assert!(retired.mark_checked_out().is_err());

        let out = item().mark_checked_out().unwrap();
        assert!(out.retire().is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ItemStatus::Available.to_string(), "AVAILABLE");
        assert_eq!(ItemStatus::CheckedOut.to_string(), "CHECKED_OUT");
        assert_eq!(ItemStatus::Maintenance.to_string(), "MAINTENANCE");
        assert_eq!(ItemStatus::Retired.to_string(), "RETIRED");
    }
}
