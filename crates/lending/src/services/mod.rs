//! Ports the lending use cases depend on, with in-memory implementations.

pub mod clock;
pub mod ids;
pub mod memory;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{IdGenerator, UuidIdGenerator};
pub use memory::InMemoryLendingStore;
pub use store::{
    ChangeSet, CheckoutRepository, CommitGuard, Committed, GearCatalog, StoreError,
};
