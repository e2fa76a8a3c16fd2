use std::sync::Arc;
use uuid::Uuid;

use super::lifecycle::LifecycleAction;
use super::ServiceError;
use crate::clock::Clock;
use crate::database::record::{AuditEntry, FundRecord, Visibility};
use crate::database::FundStore;
use crate::types::FundKind;

/// Deleted-records admin: list, restore, and irreversible purge
#[derive(Clone)]
pub struct RecoveryService {
    store: Arc<dyn FundStore>,
    clock: Arc<dyn Clock>,
}

impl RecoveryService {
    pub fn new(store: Arc<dyn FundStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Soft-deleted rows, most recently deleted first
    pub async fn list_deleted(&self, kind: FundKind) -> Result<Vec<FundRecord>, ServiceError> {
        self.store
            .list_records(kind, Visibility::Deleted)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching deleted {} records: {}", kind, e);
                ServiceError::from(e)
            })
    }

    pub async fn restore(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
    ) -> Result<FundRecord, ServiceError> {
        let current = self.store.get_record(kind, id).await?.ok_or(ServiceError::NotFound)?;
        current.state().apply(LifecycleAction::Restore)?;

        match self.store.restore_record(kind, id, acting_user, self.clock.now()).await? {
            Some(record) => {
                tracing::info!("Restored {} record {} by '{}'", kind, id, acting_user);
                Ok(record)
            }
            None => {
                let current = self.store.get_record(kind, id).await?.ok_or(ServiceError::NotFound)?;
                current.state().apply(LifecycleAction::Restore)?;
                Err(ServiceError::Conflict(Box::new(current)))
            }
        }
    }

    /// Permanently remove a soft-deleted record and append its audit entry.
    ///
    /// A live record is refused before any write, so `Gone` is only reachable
    /// through `SoftDeleted`.
    pub async fn hard_delete(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
    ) -> Result<AuditEntry, ServiceError> {
        let current = self.store.get_record(kind, id).await?.ok_or(ServiceError::NotFound)?;
        if let Err(e) = current.state().apply(LifecycleAction::Purge) {
            tracing::warn!("Refused hard delete of live {} record {} by '{}'", kind, id, acting_user);
            return Err(e.into());
        }

        let purged = self
            .store
            .purge_record(kind, id, acting_user, self.clock.now())
            .await
            .map_err(|e| {
                tracing::error!("Hard delete of {} record {} failed: {}", kind, id, e);
                ServiceError::from(e)
            })?;

        match purged {
            Some(entry) => {
                tracing::info!("HARD DELETED {} record {} by '{}'", kind, id, acting_user);
                Ok(entry)
            }
            None => {
                // Restored or purged concurrently
                let current = self.store.get_record(kind, id).await?.ok_or(ServiceError::NotFound)?;
                current.state().apply(LifecycleAction::Purge)?;
                Err(ServiceError::Conflict(Box::new(current)))
            }
        }
    }

    pub async fn audit_trail(&self, kind: FundKind) -> Result<Vec<AuditEntry>, ServiceError> {
        Ok(self.store.audit_trail(kind).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::MemoryStore;
    use crate::services::lifecycle::LifecycleError;
    use crate::services::MutationService;
    use crate::types::AuditAction;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    struct Fixture {
        mutations: MutationService,
        recovery: RecoveryService,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    }

    fn setup() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap()));
        Fixture {
            mutations: MutationService::new(store.clone(), clock.clone()),
            recovery: RecoveryService::new(store.clone(), clock.clone()),
            store,
            clock,
        }
    }

    async fn incoming(f: &Fixture) -> FundRecord {
        f.mutations
            .create(
                FundKind::Incoming,
                &json!({"date": "2024-08-01", "amount": 100, "source": "Cash", "approved_by": "Marshall Epie"}),
                "Marshall Epie",
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn hard_delete_of_live_record_changes_nothing() {
        let f = setup();
        let record = incoming(&f).await;

        let err = f.recovery.hard_delete(FundKind::Incoming, record.id, "Marshall Epie").await.unwrap_err();
        assert!(matches!(err, ServiceError::Lifecycle(LifecycleError::NotSoftDeleted)));
        assert_eq!(f.store.record_count(FundKind::Incoming).await, 1);
        assert!(f.store.audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn hard_delete_after_soft_delete_writes_one_audit_entry() {
        let f = setup();
        let record = incoming(&f).await;
        f.mutations.soft_delete(FundKind::Incoming, record.id, "Marshall Epie").await.unwrap();

        let entry = f.recovery.hard_delete(FundKind::Incoming, record.id, "Fitz Shrowder").await.unwrap();
        assert_eq!(entry.action, AuditAction::Delete);
        assert_eq!(entry.changed_by, "Fitz Shrowder");
        assert_eq!(entry.old_values["id"], json!(record.id));
        assert_eq!(entry.old_values["is_deleted"], json!(true));
        assert!(entry.new_values.is_none());

        assert_eq!(f.store.audit_entries().await.len(), 1);
        let again = f.recovery.hard_delete(FundKind::Incoming, record.id, "Fitz Shrowder").await.unwrap_err();
        assert!(matches!(again, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn restore_clears_deletion_flags() {
        let f = setup();
        let record = incoming(&f).await;
        f.mutations.soft_delete(FundKind::Incoming, record.id, "Marshall Epie").await.unwrap();

        f.clock.advance(Duration::minutes(5));
        let restored = f.recovery.restore(FundKind::Incoming, record.id, "Aruna Ramineni").await.unwrap();
        assert!(!restored.is_deleted);
        assert!(restored.deleted_at.is_none());
        assert!(restored.deleted_by.is_none());
        assert_eq!(restored.updated_by, "Aruna Ramineni");
    }

    #[tokio::test]
    async fn deleted_list_is_newest_deletion_first() {
        let f = setup();
        let first = incoming(&f).await;
        let second = incoming(&f).await;
        let _live = incoming(&f).await;

        f.mutations.soft_delete(FundKind::Incoming, first.id, "Marshall Epie").await.unwrap();
        f.clock.advance(Duration::minutes(1));
        f.mutations.soft_delete(FundKind::Incoming, second.id, "Marshall Epie").await.unwrap();

        let ids: Vec<Uuid> = f.recovery.list_deleted(FundKind::Incoming).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
