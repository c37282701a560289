//! Audit trail for lending operations.
//!
//! Use cases publish an [`AuditRecord`] for every persisted state change.
//! Publication is best-effort: a failing [`AuditSink`] is reported by the
//! caller but never rolls back the change it describes.

pub mod error;
pub mod memory;
pub mod query;
pub mod record;
pub mod sink;

pub use error::{AuditError, Result};
pub use memory::InMemoryAuditLog;
pub use query::AuditQuery;
pub use record::{AuditRecord, AuditRecordBuilder};
pub use sink::AuditSink;
