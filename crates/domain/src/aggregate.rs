//! Core aggregate and domain event traits.

use common::Version;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// This is used for audit records and filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates persisted as whole values.
///
/// An aggregate is a cluster of domain objects treated as a single unit.
/// Mutations never happen in place: every state-changing operation returns a
/// new value and leaves the receiver untouched. The stored version travels
/// with the value so the store can reject stale writes.
pub trait Aggregate: Clone + Send + Sync + Sized {
    /// The identifier type of this aggregate.
    type Id: Copy + Eq + std::hash::Hash + std::fmt::Display + Into<Uuid> + Send + Sync;

    /// Returns the aggregate type name.
    ///
    /// Used for audit records and store organization.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    fn id(&self) -> Self::Id;

    /// Returns the stored version this value was loaded at.
    ///
    /// Version 0 means the value has never been saved.
    fn version(&self) -> Version;

    /// Sets the stored version.
    ///
    /// Called by the store after loading or saving.
    fn set_version(&mut self, version: Version);

    /// Returns true if this value has never been saved.
    fn is_new(&self) -> bool {
        self.version() == Version::initial()
    }
}
