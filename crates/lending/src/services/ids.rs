//! Identifier generation.

use common::CheckoutId;

/// Source of identifiers for new checkouts.
pub trait IdGenerator: Send + Sync {
    fn next_checkout_id(&self) -> CheckoutId;
}

/// Generates random v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_checkout_id(&self) -> CheckoutId {
        CheckoutId::new()
    }
}
