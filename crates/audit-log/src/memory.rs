use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{AuditError, AuditQuery, AuditRecord, AuditSink, Result};

/// In-memory audit log.
///
/// Keeps every published record in insertion order. Can be switched into a
/// failing mode to exercise best-effort publication in tests.
#[derive(Clone, Default)]
pub struct InMemoryAuditLog {
    records: Arc<RwLock<Vec<AuditRecord>>>,
    fail_on_publish: Arc<AtomicBool>,
}

impl InMemoryAuditLog {
    /// Creates a new empty audit log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the log to reject every subsequent publish.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of records stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no records have been published.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Returns all records, oldest first.
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }

    /// Returns the records matching a query, ordered by timestamp.
    pub async fn query(&self, query: AuditQuery) -> Vec<AuditRecord> {
        let records = self.records.read().await;
        let mut matching: Vec<_> = records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        // Stable sort keeps publication order for equal timestamps
        matching.sort_by_key(|r| r.timestamp);

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        matching.into_iter().skip(offset).take(limit).collect()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn publish(&self, record: AuditRecord) -> Result<()> {
        if self.fail_on_publish.load(Ordering::SeqCst) {
            return Err(AuditError::Unavailable(
                "audit log is rejecting writes".to_string(),
            ));
        }

        tracing::debug!(
            event_type = %record.event_type,
            aggregate_id = %record.aggregate_id,
            "audit record published"
        );
        self.records.write().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::Version;
    use uuid::Uuid;

    fn record(event_type: &str, aggregate_id: Uuid, offset_secs: i64) -> AuditRecord {
        AuditRecord::builder()
            .event_type(event_type)
            .aggregate_id(aggregate_id)
            .aggregate_type("Checkout")
            .version(Version::first())
            .timestamp(Utc::now() + Duration::seconds(offset_secs))
            .payload_raw(serde_json::json!({"test": true}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn publish_stores_record() {
        let log = InMemoryAuditLog::new();
        assert!(log.is_empty().await);

        log.publish(record("CheckoutCreated", Uuid::new_v4(), 0))
            .await
            .unwrap();

        assert_eq!(log.len().await, 1);
        assert_eq!(log.records().await[0].event_type, "CheckoutCreated");
    }

    #[tokio::test]
    async fn failing_log_rejects_and_keeps_nothing() {
        let log = InMemoryAuditLog::new();
        log.set_fail_on_publish(true);

        let result = log.publish(record("ItemReturned", Uuid::new_v4(), 0)).await;

        assert!(matches!(result, Err(AuditError::Unavailable(_))));
        assert!(log.is_empty().await);

        log.set_fail_on_publish(false);
        log.publish(record("ItemReturned", Uuid::new_v4(), 0))
            .await
            .unwrap();
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn query_filters_sorts_and_paginates() {
        let log = InMemoryAuditLog::new();
        let checkout = Uuid::new_v4();

        log.publish(record("ItemReturned", checkout, 20)).await.unwrap();
        log.publish(record("CheckoutCreated", checkout, 0)).await.unwrap();
        log.publish(record("CheckoutCreated", Uuid::new_v4(), 10))
            .await
            .unwrap();

        let for_checkout = log.query(AuditQuery::for_aggregate(checkout)).await;
        assert_eq!(for_checkout.len(), 2);
        assert_eq!(for_checkout[0].event_type, "CheckoutCreated");
        assert_eq!(for_checkout[1].event_type, "ItemReturned");

        let created = log
            .query(AuditQuery::for_event_type("CheckoutCreated"))
            .await;
        assert_eq!(created.len(), 2);

        let page = log.query(AuditQuery::new().offset(1).limit(1)).await;
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].aggregate_id, created[1].aggregate_id);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let log = InMemoryAuditLog::new();
        log.publish(record("CheckoutCreated", Uuid::new_v4(), 0))
            .await
            .unwrap();
        log.clear().await;
        assert!(log.is_empty().await);
    }
}
