use async_trait::async_trait;

use crate::{AuditRecord, Result};

/// Destination for audit records.
///
/// Implementations must be thread-safe. Callers treat a failed publish as
/// reportable but non-fatal.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Publishes a single record.
    async fn publish(&self, record: AuditRecord) -> Result<()>;
}
