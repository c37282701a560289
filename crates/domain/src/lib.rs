//! Domain layer for the gear-room lending system.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate and DomainEvent traits shared by persisted entities
//! - The equipment catalog: gear types and individually-tracked gear items
//! - The Checkout aggregate with its return/partial-return/completion state machine

pub mod aggregate;
pub mod catalog;
pub mod checkout;

pub use aggregate::{Aggregate, DomainEvent};
pub use catalog::{
    CatalogCommand, CatalogError, Condition, GearItem, GearType, ItemStatus, Tracking,
};
pub use checkout::{
    Checkout, CheckoutDataError, CheckoutEvent, CheckoutLineItem, CheckoutStatus, CreateError,
    ItemReturn, LineDataError, LineKind, LineSpec, ReturnBulkError, ReturnItemError,
};
