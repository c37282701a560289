//! Checkout status derivation.

use serde::{Deserialize, Serialize};

use super::CheckoutLineItem;

/// The status of a checkout in its lifecycle.
///
/// Status is never stored; it is derived from line item state every time
/// it is asked for.
///
/// ```text
/// Active ──► PartiallyReturned ──► Completed
///    └─────────────────────────────────▲
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutStatus {
    /// No line shows any return progress.
    Active,

    /// Some lines have return progress but not every line is resolved.
    PartiallyReturned,

    /// Every line is fully resolved (terminal state).
    Completed,
}

impl CheckoutStatus {
    /// Derives the status of a set of line items.
    pub fn derive(lines: &[CheckoutLineItem]) -> Self {
        if lines.iter().all(CheckoutLineItem::is_resolved) {
            CheckoutStatus::Completed
        } else if lines.iter().any(CheckoutLineItem::has_return_progress) {
            CheckoutStatus::PartiallyReturned
        } else {
            CheckoutStatus::Active
        }
    }

    /// Returns true if returns can still be recorded in this status.
    pub fn accepts_returns(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutStatus::Completed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStatus::Active => "ACTIVE",
            CheckoutStatus::PartiallyReturned => "PARTIALLY_RETURNED",
            CheckoutStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
