//! Checkout and return reconciliation use cases.

use std::time::Instant;

use audit_log::{AuditRecord, AuditSink};
use chrono::{DateTime, Utc};
use common::GearItemId;
use domain::{Aggregate, Checkout, CheckoutEvent, Condition, DomainEvent, GearItem, LineSpec};

use crate::config::Config;
use crate::error::{LendingError, Result};
use crate::queries::{EligibilityPolicy, Ineligibility, MemberStanding};
use crate::requests::{
    CheckoutLineRequest, CreateCheckout, ReturnBatch, ReturnItemByCode, ReturnRequest,
};
use crate::services::{
    ChangeSet, CheckoutRepository, Clock, CommitGuard, Committed, GearCatalog, IdGenerator,
    StoreError,
};

/// Result of a successful checkout creation.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    /// The stored checkout.
    pub checkout: Checkout,

    /// Individually-tracked items, now checked out.
    pub items: Vec<GearItem>,
}

/// Result of a successful single-item return.
#[derive(Debug, Clone)]
pub struct ItemReturnOutcome {
    pub checkout: Checkout,

    /// The returned item, available or in maintenance.
    pub item: GearItem,

    /// Conflicts retried before the return went through.
    pub retries: u32,
}

/// Result of a successful batch return.
#[derive(Debug, Clone)]
pub struct BatchReturnOutcome {
    pub checkout: Checkout,
    pub items: Vec<GearItem>,
    pub bulk_units_returned: u32,
}

/// Orchestrates checkouts and returns against the catalog and checkout store.
///
/// Every use case loads what it needs, applies pure domain operations, and
/// writes the checkout together with the affected catalog items in one
/// commit. Audit records are published after the commit and never undo it.
pub struct CheckoutService<S, A, C, G>
where
    S: CheckoutRepository + GearCatalog,
    A: AuditSink,
    C: Clock,
    G: IdGenerator,
{
    store: S,
    audit: A,
    clock: C,
    ids: G,
    config: Config,
}

impl<S, A, C, G> CheckoutService<S, A, C, G>
where
    S: CheckoutRepository + GearCatalog,
    A: AuditSink,
    C: Clock,
    G: IdGenerator,
{
    /// Creates a new checkout service.
    pub fn new(store: S, audit: A, clock: C, ids: G, config: Config) -> Self {
        Self {
            store,
            audit,
            clock,
            ids,
            config,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lends equipment to a member.
    ///
    /// The member must be eligible, every individual item available, and
    /// every bulk type stocked for the requested quantity. Due dates come
    /// from each gear type's checkout duration.
    #[tracing::instrument(
        skip(self, cmd),
        fields(member_id = %cmd.member_id, lines = cmd.lines.len())
    )]
    pub async fn create_checkout(&self, cmd: CreateCheckout) -> Result<CheckoutOutcome> {
        let started = Instant::now();
        let now = self.clock.now();

        let history = self.store.list_by_member(cmd.member_id).await?;
        let standing = MemberStanding::evaluate(
            cmd.member_id,
            &history,
            now,
            EligibilityPolicy::from(&self.config),
        );
        if let Some(reason) = standing.ineligibility {
            tracing::info!(member_id = %cmd.member_id, %reason, "checkout refused");
            return Err(LendingError::MemberNotEligible {
                member_id: cmd.member_id,
                reason,
            });
        }

        let mut specs = Vec::with_capacity(cmd.lines.len());
        let mut lent_items = Vec::new();
        // Re-checked inside the commit; another checkout may land in between.
        let mut guards = vec![CommitGuard::OpenCheckoutLimit {
            member_id: cmd.member_id,
            limit: self.config.max_active_checkouts,
        }];
        for line in &cmd.lines {
            let spec = match line {
                CheckoutLineRequest::ItemCode { code } => {
                    let item = self
                        .store
                        .find_item_by_code(code)
                        .await?
                        .ok_or_else(|| LendingError::ItemNotFound(code.clone()))?;
                    self.resolve_item(item, now, &mut lent_items).await?
                }
                CheckoutLineRequest::Item { gear_item_id } => {
                    let item = self
                        .store
                        .find_item(*gear_item_id)
                        .await?
                        .ok_or_else(|| LendingError::ItemNotFound(gear_item_id.to_string()))?;
                    self.resolve_item(item, now, &mut lent_items).await?
                }
                CheckoutLineRequest::Bulk {
                    gear_type_id,
                    quantity,
                } => {
                    let gear_type = self
                        .store
                        .find_gear_type(*gear_type_id)
                        .await?
                        .ok_or(LendingError::GearTypeNotFound(*gear_type_id))?;
                    let total = gear_type
                        .total_quantity()
                        .ok_or(LendingError::NotBulkTracked(*gear_type_id))?;
                    let outstanding = self.store.bulk_outstanding(*gear_type_id).await?;
                    let available = total.saturating_sub(outstanding);
                    if *quantity > available {
                        return Err(LendingError::InsufficientBulkStock {
                            gear_type_id: *gear_type_id,
                            requested: *quantity,
                            available,
                        });
                    }
                    guards.push(CommitGuard::BulkStock {
                        gear_type_id: *gear_type_id,
                        total_quantity: total,
                    });
                    LineSpec::bulk(*gear_type_id, *quantity, gear_type.due_at(now))
                }
            };
            specs.push(spec);
        }

        let checkout = Checkout::create(
            self.ids.next_checkout_id(),
            cmd.member_id,
            cmd.staff_member_id,
            specs,
            cmd.notes,
            now,
        )?;

        let mut checked_out = Vec::with_capacity(lent_items.len());
        for command in checkout.checkout_commands() {
            let item = lent_items
                .iter()
                .find(|item| item.id() == command.gear_item_id())
                .ok_or_else(|| LendingError::ItemNotFound(command.gear_item_id().to_string()))?;
            checked_out.push(command.apply_to(item)?);
        }

        let changes = ChangeSet::new()
            .with_checkout(checkout)
            .with_items(checked_out)
            .with_guards(guards);
        let committed = self.store.commit(changes).await.map_err(guard_rejection)?;
        let (checkout, items) = split(committed)?;

        self.publish(&checkout, CheckoutEvent::checkout_created(&checkout), now)
            .await;

        metrics::counter!("lending_checkouts_created_total").increment(1);
        record_duration("create_checkout", started);
        tracing::info!(
            checkout_id = %checkout.id(),
            items = items.len(),
            "checkout created"
        );

        Ok(CheckoutOutcome { checkout, items })
    }

    /// Returns a single item identified by the code on its tag.
    ///
    /// Finds the open checkout holding the item, records the return on it,
    /// and moves the item back on the shelf or into maintenance. A version
    /// conflict reloads and reapplies up to the configured retry limit.
    #[tracing::instrument(skip(self), fields(code = %cmd.code))]
    pub async fn return_item_by_code(&self, cmd: ReturnItemByCode) -> Result<ItemReturnOutcome> {
        let started = Instant::now();
        let now = self.clock.now();

        let mut retries = 0;
        let (checkout, item) = loop {
            match self.try_return_by_code(&cmd, now).await {
                Err(LendingError::Store(err))
                    if err.is_conflict() && retries < self.config.conflict_retries =>
                {
                    retries += 1;
                    metrics::counter!("lending_concurrency_retries_total").increment(1);
                    tracing::warn!(error = %err, retries, "version conflict, reloading");
                }
                result => break result?,
            }
        };

        self.publish(
            &checkout,
            CheckoutEvent::item_returned(&checkout, &item, now),
            now,
        )
        .await;

        metrics::counter!("lending_items_returned_total", "mode" => "individual").increment(1);
        record_duration("return_item_by_code", started);
        tracing::info!(
            checkout_id = %checkout.id(),
            gear_item_id = %item.id(),
            item_status = %item.status(),
            completed = checkout.is_completed(),
            "item returned"
        );

        Ok(ItemReturnOutcome {
            checkout,
            item,
            retries,
        })
    }

    async fn try_return_by_code(
        &self,
        cmd: &ReturnItemByCode,
        now: DateTime<Utc>,
    ) -> Result<(Checkout, GearItem)> {
        let item = self
            .store
            .find_item_by_code(&cmd.code)
            .await?
            .ok_or_else(|| LendingError::ItemNotFound(cmd.code.clone()))?;

        if !item.status().can_return() {
            return Err(LendingError::ItemNotCheckedOut {
                code: item.code().to_string(),
                status: item.status(),
            });
        }

        let checkout = self
            .store
            .find_open_checkout_for_item(item.id())
            .await?
            .ok_or_else(|| LendingError::OpenCheckoutMissing {
                gear_item_id: item.id(),
                code: item.code().to_string(),
            })?;

        let result =
            checkout.return_individual_item(item.id(), cmd.condition, cmd.notes.clone(), now)?;
        let returned = result.catalog_command.apply_to(&item)?;

        let (checkout, mut items) = split(
            self.store
                .commit(
                    ChangeSet::new()
                        .with_checkout(result.checkout)
                        .with_item(returned),
                )
                .await?,
        )?;
        let item = items
            .pop()
            .ok_or_else(|| StoreError::Unavailable("commit did not return the item".to_string()))?;

        Ok((checkout, item))
    }

    /// Applies several returns to one checkout as a single unit.
    ///
    /// Requests run in order on a working copy. The first failure aborts
    /// the whole batch and nothing is persisted. Conflicts are not retried.
    #[tracing::instrument(
        skip(self, batch),
        fields(checkout_id = %batch.checkout_id, requests = batch.requests.len())
    )]
    pub async fn return_batch(&self, batch: ReturnBatch) -> Result<BatchReturnOutcome> {
        let started = Instant::now();
        let now = self.clock.now();
        let checkout_id = batch.checkout_id;

        let checkout = self
            .store
            .load_checkout(checkout_id)
            .await?
            .ok_or(LendingError::CheckoutNotFound(checkout_id))?;

        if checkout.is_completed() {
            return Err(LendingError::CheckoutAlreadyCompleted(checkout_id));
        }
        if batch.requests.is_empty() {
            return Err(LendingError::EmptyBatch(checkout_id));
        }

        let request_count = batch.requests.len();
        let mut working = checkout;
        let mut returned_items = Vec::new();
        let mut bulk_units_returned = 0;

        for (index, request) in batch.requests.into_iter().enumerate() {
            working = match request {
                ReturnRequest::Individual {
                    gear_item_id,
                    condition,
                    notes,
                } => {
                    let (next, item) = self
                        .apply_individual_return(&working, gear_item_id, condition, notes, now)
                        .await
                        .map_err(|e| e.in_batch(index))?;
                    returned_items.push(item);
                    next
                }
                ReturnRequest::Bulk {
                    gear_type_id,
                    quantity,
                    notes,
                } => {
                    let next = working
                        .return_bulk_quantity(gear_type_id, quantity, notes, now)
                        .map_err(|e| LendingError::from(e).in_batch(index))?;
                    bulk_units_returned += quantity;
                    next
                }
            };
        }

        let (checkout, items) = split(
            self.store
                .commit(
                    ChangeSet::new()
                        .with_checkout(working)
                        .with_items(returned_items),
                )
                .await?,
        )?;

        self.publish(
            &checkout,
            CheckoutEvent::items_returned(
                &checkout,
                request_count,
                items.len(),
                bulk_units_returned,
                now,
            ),
            now,
        )
        .await;

        metrics::counter!("lending_batch_returns_total").increment(1);
        metrics::counter!("lending_items_returned_total", "mode" => "individual")
            .increment(items.len() as u64);
        metrics::counter!("lending_items_returned_total", "mode" => "bulk")
            .increment(u64::from(bulk_units_returned));
        record_duration("return_batch", started);
        tracing::info!(
            checkout_id = %checkout.id(),
            items = items.len(),
            bulk_units_returned,
            completed = checkout.is_completed(),
            "batch returned"
        );

        Ok(BatchReturnOutcome {
            checkout,
            items,
            bulk_units_returned,
        })
    }

    async fn apply_individual_return(
        &self,
        working: &Checkout,
        gear_item_id: GearItemId,
        condition: Condition,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Checkout, GearItem)> {
        let result = working.return_individual_item(gear_item_id, condition, notes, now)?;
        let item = self
            .store
            .find_item(gear_item_id)
            .await?
            .ok_or_else(|| LendingError::ItemNotFound(gear_item_id.to_string()))?;
        let returned = result.catalog_command.apply_to(&item)?;
        Ok((result.checkout, returned))
    }

    /// Signs off a repair and puts the item back on the shelf.
    #[tracing::instrument(skip(self))]
    pub async fn complete_maintenance(&self, code: &str, condition: Condition) -> Result<GearItem> {
        let item = self.find_item_by_code(code).await?;
        let repaired = item.complete_maintenance(condition)?;
        let item = self.commit_item(repaired).await?;

        tracing::info!(gear_item_id = %item.id(), %condition, "maintenance completed");
        Ok(item)
    }

    /// Permanently removes an item from circulation.
    #[tracing::instrument(skip(self))]
    pub async fn retire_item(&self, code: &str) -> Result<GearItem> {
        let item = self.find_item_by_code(code).await?;
        let retired = item.retire()?;
        let item = self.commit_item(retired).await?;

        tracing::info!(gear_item_id = %item.id(), "item retired");
        Ok(item)
    }

    async fn resolve_item(
        &self,
        item: GearItem,
        now: DateTime<Utc>,
        lent_items: &mut Vec<GearItem>,
    ) -> Result<LineSpec> {
        if !item.is_available() {
            return Err(LendingError::ItemUnavailable {
                code: item.code().to_string(),
                status: item.status(),
            });
        }

        let gear_type = self
            .store
            .find_gear_type(item.gear_type_id())
            .await?
            .ok_or(LendingError::GearTypeNotFound(item.gear_type_id()))?;

        let spec = LineSpec::individual(item.id(), gear_type.due_at(now))
            .with_condition(item.condition());
        lent_items.push(item);
        Ok(spec)
    }

    async fn find_item_by_code(&self, code: &str) -> Result<GearItem> {
        self.store
            .find_item_by_code(code)
            .await?
            .ok_or_else(|| LendingError::ItemNotFound(code.to_string()))
    }

    async fn commit_item(&self, item: GearItem) -> Result<GearItem> {
        let committed = self.store.commit(ChangeSet::new().with_item(item)).await?;
        committed
            .items
            .into_iter()
            .next()
            .ok_or_else(|| {
                StoreError::Unavailable("commit did not return the item".to_string()).into()
            })
    }

    /// Publishes an audit record. Failures are logged and counted, never returned.
    async fn publish(&self, checkout: &Checkout, event: CheckoutEvent, at: DateTime<Utc>) {
        let event_type = event.event_type();
        let record = AuditRecord::builder()
            .event_type(event_type)
            .aggregate_id(checkout.id())
            .aggregate_type(Checkout::aggregate_type())
            .version(checkout.version())
            .timestamp(at)
            .metadata(
                "staff_member_id",
                serde_json::Value::String(checkout.staff_member_id().to_string()),
            )
            .payload(&event)
            .and_then(|builder| builder.build());

        let outcome = match record {
            Ok(record) => self.audit.publish(record).await,
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            metrics::counter!("lending_audit_failures_total").increment(1);
            tracing::warn!(
                checkout_id = %checkout.id(),
                event_type,
                error = %e,
                "audit publication failed"
            );
        }
    }
}

fn split(committed: Committed) -> Result<(Checkout, Vec<GearItem>)> {
    let checkout = committed
        .checkout
        .ok_or_else(|| StoreError::Unavailable("commit did not return the checkout".to_string()))?;
    Ok((checkout, committed.items))
}

/// Maps a guard that failed inside the commit to the error the up-front
/// check would have given.
fn guard_rejection(err: StoreError) -> LendingError {
    match err {
        StoreError::InsufficientStock {
            gear_type_id,
            requested,
            available,
        } => LendingError::InsufficientBulkStock {
            gear_type_id,
            requested,
            available,
        },
        StoreError::OpenCheckoutLimit {
            member_id,
            open,
            limit,
        } => LendingError::MemberNotEligible {
            member_id,
            reason: Ineligibility::TooManyActiveCheckouts { open, limit },
        },
        other => LendingError::Store(other),
    }
}

fn record_duration(use_case: &'static str, started: Instant) {
    metrics::histogram!("lending_use_case_duration_seconds", "use_case" => use_case)
        .record(started.elapsed().as_secs_f64());
}
