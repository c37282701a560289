//! Shared types for the gear-room lending system.

pub mod types;

pub use types::{CheckoutId, GearItemId, GearTypeId, MemberId, StaffMemberId, Version};
