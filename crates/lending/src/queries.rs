//! Eligibility and overdue queries derived from checkout state.

use chrono::{DateTime, Utc};
use common::{CheckoutId, MemberId, StaffMemberId};
use domain::{Aggregate, Checkout, CheckoutStatus};
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::services::CheckoutRepository;

/// Limits a member must be within to borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    pub max_active_checkouts: usize,
    pub block_on_overdue: bool,
}

impl From<&Config> for EligibilityPolicy {
    fn from(config: &Config) -> Self {
        Self {
            max_active_checkouts: config.max_active_checkouts,
            block_on_overdue: config.block_on_overdue,
        }
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Why a member may not borrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Ineligibility {
    /// At least one checkout has an overdue line.
    OverdueItems {
        overdue_checkouts: usize,
        max_days_overdue: i64,
    },

    /// The member already holds the maximum number of open checkouts.
    TooManyActiveCheckouts { open: usize, limit: usize },
}

impl std::fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ineligibility::OverdueItems {
                overdue_checkouts,
                max_days_overdue,
            } => write!(
                f,
                "{overdue_checkouts} overdue checkout(s), up to {max_days_overdue} day(s) late"
            ),
            Ineligibility::TooManyActiveCheckouts { open, limit } => {
                write!(f, "{open} open checkout(s), limit is {limit}")
            }
        }
    }
}

/// A member's borrowing position at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberStanding {
    pub member_id: MemberId,
    pub as_of: DateTime<Utc>,
    pub open_checkouts: usize,
    pub overdue_checkouts: usize,
    pub overdue_lines: usize,
    pub max_days_overdue: i64,

    /// None if the member may borrow.
    pub ineligibility: Option<Ineligibility>,
}

impl MemberStanding {
    /// Evaluates a member's standing from all of their checkouts.
    ///
    /// Overdue items take precedence over the open checkout limit.
    pub fn evaluate(
        member_id: MemberId,
        checkouts: &[Checkout],
        as_of: DateTime<Utc>,
        policy: EligibilityPolicy,
    ) -> Self {
        let open: Vec<&Checkout> = checkouts.iter().filter(|c| !c.is_completed()).collect();
        let overdue: Vec<&Checkout> = open
            .iter()
            .copied()
            .filter(|c| c.is_overdue(as_of))
            .collect();
        let overdue_lines = overdue.iter().map(|c| c.overdue_lines(as_of).len()).sum();
        let max_days_overdue = overdue
            .iter()
            .map(|c| c.max_days_overdue(as_of))
            .max()
            .unwrap_or(0);

        let ineligibility = if policy.block_on_overdue && !overdue.is_empty() {
            Some(Ineligibility::OverdueItems {
                overdue_checkouts: overdue.len(),
                max_days_overdue,
            })
        } else if open.len() >= policy.max_active_checkouts {
            Some(Ineligibility::TooManyActiveCheckouts {
                open: open.len(),
                limit: policy.max_active_checkouts,
            })
        } else {
            None
        };

        Self {
            member_id,
            as_of,
            open_checkouts: open.len(),
            overdue_checkouts: overdue.len(),
            overdue_lines,
            max_days_overdue,
            ineligibility,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.ineligibility.is_none()
    }
}

/// One row of the overdue report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverdueEntry {
    pub checkout_id: CheckoutId,
    pub member_id: MemberId,
    pub staff_member_id: StaffMemberId,
    pub overdue_lines: usize,
    pub max_days_overdue: i64,
    pub earliest_due_at: DateTime<Utc>,
}

impl OverdueEntry {
    fn from_checkout(checkout: &Checkout, as_of: DateTime<Utc>) -> Option<Self> {
        let lines = checkout.overdue_lines(as_of);
        let earliest_due_at = lines.iter().map(|line| line.due_at()).min()?;
        Some(Self {
            checkout_id: checkout.id(),
            member_id: checkout.member_id(),
            staff_member_id: checkout.staff_member_id(),
            overdue_lines: lines.len(),
            max_days_overdue: checkout.max_days_overdue(as_of),
            earliest_due_at,
        })
    }
}

/// Number of checkouts in each status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub active: usize,
    pub partially_returned: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn get(&self, status: CheckoutStatus) -> usize {
        match status {
            CheckoutStatus::Active => self.active,
            CheckoutStatus::PartiallyReturned => self.partially_returned,
            CheckoutStatus::Completed => self.completed,
        }
    }

    /// Checkouts that still have something out.
    pub fn open(&self) -> usize {
        self.active + self.partially_returned
    }

    pub fn total(&self) -> usize {
        self.open() + self.completed
    }
}

/// Read-side queries over stored checkouts.
pub struct LendingQueries<R: CheckoutRepository> {
    repository: R,
    policy: EligibilityPolicy,
}

impl<R: CheckoutRepository> LendingQueries<R> {
    pub fn new(repository: R, policy: EligibilityPolicy) -> Self {
        Self { repository, policy }
    }

    /// Returns a member's standing as of the given time.
    #[tracing::instrument(skip(self))]
    pub async fn member_standing(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> Result<MemberStanding> {
        let checkouts = self.repository.list_by_member(member_id).await?;
        Ok(MemberStanding::evaluate(
            member_id,
            &checkouts,
            as_of,
            self.policy,
        ))
    }

    /// Lists overdue checkouts, most days overdue first.
    #[tracing::instrument(skip(self))]
    pub async fn overdue_report(&self, as_of: DateTime<Utc>) -> Result<Vec<OverdueEntry>> {
        let checkouts = self.repository.list_overdue(as_of).await?;
        let mut entries: Vec<OverdueEntry> = checkouts
            .iter()
            .filter_map(|checkout| OverdueEntry::from_checkout(checkout, as_of))
            .collect();

        entries.sort_by(|a, b| {
            b.max_days_overdue
                .cmp(&a.max_days_overdue)
                .then(a.earliest_due_at.cmp(&b.earliest_due_at))
        });
        Ok(entries)
    }

    /// Counts checkouts per status.
    #[tracing::instrument(skip(self))]
    pub async fn status_counts(&self) -> Result<StatusCounts> {
        Ok(StatusCounts {
            active: self
                .repository
                .list_by_status(CheckoutStatus::Active)
                .await?
                .len(),
            partially_returned: self
                .repository
                .list_by_status(CheckoutStatus::PartiallyReturned)
                .await?
                .len(),
            completed: self
                .repository
                .list_by_status(CheckoutStatus::Completed)
                .await?
                .len(),
        })
    }
}
