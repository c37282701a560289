//! Lending use cases for the gear room.
//!
//! This crate wires the checkout aggregate to its collaborators:
//! - [`CheckoutService`]: checkout creation, quick return by code, batch
//!   return, maintenance sign-off and retirement
//! - [`LendingQueries`]: member standing, overdue report, status counts
//! - [`services`]: store, catalog, clock and id ports with in-memory versions
//!
//! Configuration comes from the environment through [`Config`] and logging
//! is set up by [`telemetry::init`].

pub mod config;
pub mod error;
pub mod queries;
pub mod requests;
pub mod service;
pub mod services;
pub mod telemetry;

pub use config::{Config, LogFormat};
pub use error::{LendingError, Result};
pub use queries::{
    EligibilityPolicy, Ineligibility, LendingQueries, MemberStanding, OverdueEntry, StatusCounts,
};
pub use requests::{
    CheckoutLineRequest, CreateCheckout, ReturnBatch, ReturnItemByCode, ReturnRequest,
};
pub use service::{BatchReturnOutcome, CheckoutOutcome, CheckoutService, ItemReturnOutcome};
pub use services::{
    ChangeSet, CheckoutRepository, Clock, CommitGuard, Committed, FixedClock, GearCatalog,
    IdGenerator, InMemoryLendingStore, StoreError, SystemClock, UuidIdGenerator,
};
