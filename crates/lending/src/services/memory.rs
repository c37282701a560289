//! In-memory lending store for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CheckoutId, GearItemId, GearTypeId, MemberId, Version};
use domain::{Aggregate, Checkout, CheckoutStatus, GearItem, GearType};
use tokio::sync::RwLock;

use super::store::{
    ChangeSet, CheckoutRepository, CommitGuard, Committed, GearCatalog, Result, StoreError,
};

#[derive(Debug, Default)]
struct StoreState {
    checkouts: HashMap<CheckoutId, Checkout>,
    items: HashMap<GearItemId, GearItem>,
    gear_types: HashMap<GearTypeId, GearType>,
}

/// In-memory catalog and checkout store.
///
/// All state sits behind one lock so `commit` is atomic across checkouts
/// and catalog items, the way a single database transaction would be.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLendingStore {
    state: Arc<RwLock<StoreState>>,
    fail_on_commit: Arc<AtomicBool>,
    forced_conflicts: Arc<AtomicU32>,
}

impl InMemoryLendingStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every commit to fail as if the backend were down.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `count` commits fail with a concurrency conflict.
    pub fn force_conflicts(&self, count: u32) {
        self.forced_conflicts.store(count, Ordering::SeqCst);
    }

    /// Registers a gear type in the catalog.
    pub async fn add_gear_type(&self, gear_type: GearType) {
        self.state
            .write()
            .await
            .gear_types
            .insert(gear_type.id(), gear_type);
    }

    /// Registers a new item in the catalog, returning it at its stored version.
    pub async fn add_item(&self, item: GearItem) -> Result<GearItem> {
        let committed = self.commit(ChangeSet::new().with_item(item)).await?;
        committed
            .items
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable("item was not stored".to_string()))
    }

    /// Returns the number of stored checkouts.
    pub async fn checkout_count(&self) -> usize {
        self.state.read().await.checkouts.len()
    }

    fn take_forced_conflict(&self) -> bool {
        self.forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn check_version<A: Aggregate>(value: &A, stored: Option<&A>) -> Result<()> {
    let actual = stored.map_or(Version::initial(), Aggregate::version);
    if value.version() != actual {
        return Err(StoreError::ConcurrencyConflict {
            aggregate_type: A::aggregate_type(),
            aggregate_id: value.id().into(),
            expected: value.version(),
            actual,
        });
    }
    Ok(())
}

/// Evaluates a guard against stored state as it would be after the write.
fn check_guard(
    state: &StoreState,
    incoming: Option<&Checkout>,
    guard: CommitGuard,
) -> Result<()> {
    let others = state
        .checkouts
        .values()
        .filter(|stored| incoming.is_none_or(|checkout| checkout.id() != stored.id()));

    match guard {
        CommitGuard::BulkStock {
            gear_type_id,
            total_quantity,
        } => {
            let requested = incoming.map_or(0, |c| c.outstanding_bulk_quantity(gear_type_id));
            let elsewhere: u32 = others
                .map(|c| c.outstanding_bulk_quantity(gear_type_id))
                .sum();
            let available = total_quantity.saturating_sub(elsewhere);
            if requested > available {
                return Err(StoreError::InsufficientStock {
                    gear_type_id,
                    requested,
                    available,
                });
            }
        }
        CommitGuard::OpenCheckoutLimit { member_id, limit } => {
            let opens_new = incoming.is_some_and(|c| {
                c.member_id() == member_id
                    && !c.is_completed()
                    && !state.checkouts.contains_key(&c.id())
            });
            let open = others
                .filter(|c| c.member_id() == member_id && !c.is_completed())
                .count();
            if opens_new && open >= limit {
                return Err(StoreError::OpenCheckoutLimit {
                    member_id,
                    open,
                    limit,
                });
            }
        }
    }
    Ok(())
}

fn forced_conflict(changes: &ChangeSet) -> StoreError {
    let (aggregate_type, aggregate_id, expected) = match (&changes.checkout, changes.items.first()) {
        (Some(checkout), _) => (
            Checkout::aggregate_type(),
            checkout.id().into(),
            checkout.version(),
        ),
        (None, Some(item)) => (GearItem::aggregate_type(), item.id().into(), item.version()),
        (None, None) => (Checkout::aggregate_type(), uuid::Uuid::nil(), Version::initial()),
    };
    StoreError::ConcurrencyConflict {
        aggregate_type,
        aggregate_id,
        expected,
        actual: expected.next(),
    }
}

fn newest_first(mut checkouts: Vec<Checkout>) -> Vec<Checkout> {
    checkouts.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    checkouts
}

#[async_trait]
impl GearCatalog for InMemoryLendingStore {
    async fn find_item_by_code(&self, code: &str) -> Result<Option<GearItem>> {
        let state = self.state.read().await;
        Ok(state.items.values().find(|item| item.code() == code).cloned())
    }

    async fn find_item(&self, gear_item_id: GearItemId) -> Result<Option<GearItem>> {
        Ok(self.state.read().await.items.get(&gear_item_id).cloned())
    }

    async fn find_gear_type(&self, gear_type_id: GearTypeId) -> Result<Option<GearType>> {
        Ok(self.state.read().await.gear_types.get(&gear_type_id).cloned())
    }
}

#[async_trait]
impl CheckoutRepository for InMemoryLendingStore {
    async fn load_checkout(&self, checkout_id: CheckoutId) -> Result<Option<Checkout>> {
        Ok(self.state.read().await.checkouts.get(&checkout_id).cloned())
    }

    async fn find_open_checkout_for_item(
        &self,
        gear_item_id: GearItemId,
    ) -> Result<Option<Checkout>> {
        let state = self.state.read().await;
        Ok(state
            .checkouts
            .values()
            .find(|checkout| checkout.holds_item(gear_item_id))
            .cloned())
    }

    async fn list_by_member(&self, member_id: MemberId) -> Result<Vec<Checkout>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .checkouts
                .values()
                .filter(|checkout| checkout.member_id() == member_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_status(&self, status: CheckoutStatus) -> Result<Vec<Checkout>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .checkouts
                .values()
                .filter(|checkout| checkout.status() == status)
                .cloned()
                .collect(),
        ))
    }

    async fn list_overdue(&self, as_of: DateTime<Utc>) -> Result<Vec<Checkout>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .checkouts
                .values()
                .filter(|checkout| checkout.is_overdue(as_of))
                .cloned()
                .collect(),
        ))
    }

    async fn bulk_outstanding(&self, gear_type_id: GearTypeId) -> Result<u32> {
        let state = self.state.read().await;
        Ok(state
            .checkouts
            .values()
            .map(|checkout| checkout.outstanding_bulk_quantity(gear_type_id))
            .sum())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Committed> {
        if self.fail_on_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("commit rejected".to_string()));
        }

        let mut state = self.state.write().await;

        if self.take_forced_conflict() {
            return Err(forced_conflict(&changes));
        }

        // Validate everything before writing anything.
        if let Some(checkout) = &changes.checkout {
            check_version(checkout, state.checkouts.get(&checkout.id()))?;
        }
        for item in &changes.items {
            check_version(item, state.items.get(&item.id()))?;
            let code_taken = state
                .items
                .values()
                .any(|other| other.code() == item.code() && other.id() != item.id());
            if code_taken {
                return Err(StoreError::DuplicateCode(item.code().to_string()));
            }
        }
        for guard in &changes.guards {
            check_guard(&state, changes.checkout.as_ref(), *guard)?;
        }

        let checkout = changes.checkout.map(|mut checkout| {
            checkout.set_version(checkout.version().next());
            state.checkouts.insert(checkout.id(), checkout.clone());
            checkout
        });

        let items = changes
            .items
            .into_iter()
            .map(|mut item| {
                item.set_version(item.version().next());
                state.items.insert(item.id(), item.clone());
                item
            })
            .collect();

        Ok(Committed { checkout, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::StaffMemberId;
    use domain::{Condition, LineSpec};

    fn checkout_for(item: &GearItem, member_id: MemberId) -> Checkout {
        let now = Utc::now();
        Checkout::create(
            CheckoutId::new(),
            member_id,
            StaffMemberId::new(),
            vec![LineSpec::individual(item.id(), now + Duration::days(2))],
            None,
            now,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_item_and_find_by_code() {
        let store = InMemoryLendingStore::new();
        let item = GearItem::new(GearTypeId::new(), "PACK-11", Condition::Good);

        let stored = store.add_item(item.clone()).await.unwrap();
        assert_eq!(stored.version(), Version::first());

        let found = store.find_item_by_code("PACK-11").await.unwrap().unwrap();
        assert_eq!(found.id(), item.id());
        assert!(store.find_item_by_code("PACK-12").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let store = InMemoryLendingStore::new();
        let type_id = GearTypeId::new();
        store
            .add_item(GearItem::new(type_id, "PACK-11", Condition::Good))
            .await
            .unwrap();

        let result = store
            .add_item(GearItem::new(type_id, "PACK-11", Condition::Fair))
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateCode(code)) if code == "PACK-11"));
    }

    #[tokio::test]
    async fn test_stale_checkout_rejected() {
        let store = InMemoryLendingStore::new();
        let item = store
            .add_item(GearItem::new(GearTypeId::new(), "PACK-11", Condition::Good))
            .await
            .unwrap();
        let checkout = checkout_for(&item, MemberId::new());

        let stored = store
            .commit(ChangeSet::new().with_checkout(checkout.clone()))
            .await
            .unwrap()
            .checkout
            .unwrap();
        assert_eq!(stored.version(), Version::first());

        // Saving the original value again means saving from version 0.
        let result = store.commit(ChangeSet::new().with_checkout(checkout)).await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict {
                aggregate_type: "Checkout",
                actual,
                ..
            }) if actual == Version::first()
        ));
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = InMemoryLendingStore::new();
        let item = store
            .add_item(GearItem::new(GearTypeId::new(), "PACK-11", Condition::Good))
            .await
            .unwrap();
        let checkout = checkout_for(&item, MemberId::new());

        // The item is sent at a stale version, so the checkout must not land either.
        let stale_item = GearItem::new(item.gear_type_id(), "PACK-12", Condition::Good);
        let mut stale_item = stale_item.mark_checked_out().unwrap();
        stale_item.set_version(Version::new(4));

        let result = store
            .commit(
                ChangeSet::new()
                    .with_checkout(checkout.clone())
                    .with_item(stale_item),
            )
            .await;
        assert!(result.unwrap_err().is_conflict());
        assert_eq!(store.checkout_count().await, 0);
        assert!(store.load_checkout(checkout.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_on_commit() {
        let store = InMemoryLendingStore::new();
        store.set_fail_on_commit(true);

        let result = store
            .add_item(GearItem::new(GearTypeId::new(), "PACK-11", Condition::Good))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(store.find_item_by_code("PACK-11").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_forced_conflicts_are_consumed() {
        let store = InMemoryLendingStore::new();
        store.force_conflicts(1);

        let first = store
            .add_item(GearItem::new(GearTypeId::new(), "PACK-11", Condition::Good))
            .await;
        assert!(first.unwrap_err().is_conflict());

        let second = store
            .add_item(GearItem::new(GearTypeId::new(), "PACK-11", Condition::Good))
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_checkout_queries() {
        let store = InMemoryLendingStore::new();
        let member = MemberId::new();
        let item = store
            .add_item(GearItem::new(GearTypeId::new(), "PACK-11", Condition::Good))
            .await
            .unwrap();
        let checkout = checkout_for(&item, member);
        store
            .commit(ChangeSet::new().with_checkout(checkout.clone()))
            .await
            .unwrap();

        let open = store.find_open_checkout_for_item(item.id()).await.unwrap();
        assert_eq!(open.map(|c| c.id()), Some(checkout.id()));

        assert_eq!(store.list_by_member(member).await.unwrap().len(), 1);
        assert!(store.list_by_member(MemberId::new()).await.unwrap().is_empty());
        assert_eq!(
            store.list_by_status(CheckoutStatus::Active).await.unwrap().len(),
            1
        );
        assert!(store.list_overdue(Utc::now()).await.unwrap().is_empty());
        assert_eq!(
            store
                .list_overdue(Utc::now() + Duration::days(3))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_bulk_outstanding_sums_open_lines() {
        let store = InMemoryLendingStore::new();
        let rope = GearTypeId::new();
        let now = Utc::now();

        for quantity in [3, 4] {
            let checkout = Checkout::create(
                CheckoutId::new(),
                MemberId::new(),
                StaffMemberId::new(),
                vec![LineSpec::bulk(rope, quantity, now + Duration::days(1))],
                None,
                now,
            )
            .unwrap();
            store
                .commit(ChangeSet::new().with_checkout(checkout))
                .await
                .unwrap();
        }

        assert_eq!(store.bulk_outstanding(rope).await.unwrap(), 7);
        assert_eq!(store.bulk_outstanding(GearTypeId::new()).await.unwrap(), 0);
    }

    fn rope_checkout(member_id: MemberId, rope: GearTypeId, quantity: u32) -> Checkout {
        let now = Utc::now();
        Checkout::create(
            CheckoutId::new(),
            member_id,
            StaffMemberId::new(),
            vec![LineSpec::bulk(rope, quantity, now + Duration::days(1))],
            None,
            now,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_bulk_stock_guard_checked_at_commit() {
        let store = InMemoryLendingStore::new();
        let rope = GearTypeId::new();
        let guard = CommitGuard::BulkStock {
            gear_type_id: rope,
            total_quantity: 10,
        };
        store
            .commit(
                ChangeSet::new()
                    .with_checkout(rope_checkout(MemberId::new(), rope, 7))
                    .with_guard(guard),
            )
            .await
            .unwrap();

        let result = store
            .commit(
                ChangeSet::new()
                    .with_checkout(rope_checkout(MemberId::new(), rope, 4))
                    .with_guard(guard),
            )
            .await;

        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            })
        ));
        assert_eq!(store.checkout_count().await, 1);
        assert_eq!(store.bulk_outstanding(rope).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_open_checkout_limit_guard_only_blocks_new_checkouts() {
        let store = InMemoryLendingStore::new();
        let member = MemberId::new();
        let rope = GearTypeId::new();
        let guard = CommitGuard::OpenCheckoutLimit {
            member_id: member,
            limit: 1,
        };

        let held = store
            .commit(
                ChangeSet::new()
                    .with_checkout(rope_checkout(member, rope, 2))
                    .with_guard(guard),
            )
            .await
            .unwrap()
            .checkout
            .unwrap();

        let second = store
            .commit(
                ChangeSet::new()
                    .with_checkout(rope_checkout(member, GearTypeId::new(), 1))
                    .with_guard(guard),
            )
            .await;
        assert!(matches!(
            second,
            Err(StoreError::OpenCheckoutLimit { open: 1, limit: 1, .. })
        ));

        // Updating the checkout already held is not a new one.
        let partial = held
            .return_bulk_quantity(rope, 1, None, Utc::now())
            .unwrap();
        let updated = store
            .commit(ChangeSet::new().with_checkout(partial).with_guard(guard))
            .await;
        assert!(updated.is_ok());
    }
}
