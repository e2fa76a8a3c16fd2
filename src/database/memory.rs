use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::record::{AuditEntry, FundContent, FundRecord, Visibility};
use super::{FundStore, SessionStore, StoreError};
use crate::auth::session::Session;
use crate::clock::next_stamp;
use crate::types::FundKind;

/// Process-local store for development and tests. Holds the same four
/// tables as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
    incoming: RwLock<HashMap<Uuid, FundRecord>>,
    outgoing: RwLock<HashMap<Uuid, FundRecord>>,
    audit: RwLock<Vec<AuditEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: FundKind) -> &RwLock<HashMap<Uuid, FundRecord>> {
        match kind {
            FundKind::Incoming => &self.incoming,
            FundKind::Outgoing => &self.outgoing,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.read().await.clone()
    }

    pub async fn record_count(&self, kind: FundKind) -> usize {
        self.table(kind).read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn touch_session(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.last_activity = at;
        }
        Ok(())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl FundStore for MemoryStore {
    async fn insert_record(&self, record: &FundRecord) -> Result<FundRecord, StoreError> {
        self.table(record.kind())
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn get_record(&self, kind: FundKind, id: Uuid) -> Result<Option<FundRecord>, StoreError> {
        Ok(self.table(kind).read().await.get(&id).cloned())
    }

    async fn list_records(
        &self,
        kind: FundKind,
        visibility: Visibility,
    ) -> Result<Vec<FundRecord>, StoreError> {
        let table = self.table(kind).read().await;
        let mut rows: Vec<FundRecord> = table
            .values()
            .filter(|r| r.is_deleted == (visibility == Visibility::Deleted))
            .cloned()
            .collect();

        match visibility {
            Visibility::Active => rows.sort_by(|a, b| {
                b.content
                    .date
                    .cmp(&a.content.date)
                    .then(b.created_at.cmp(&a.created_at))
            }),
            Visibility::Deleted => rows.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at)),
        }
        Ok(rows)
    }

    async fn update_content(
        &self,
        kind: FundKind,
        id: Uuid,
        content: &FundContent,
        acting_user: &str,
        at: DateTime<Utc>,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<Option<FundRecord>, StoreError> {
        let mut table = self.table(kind).write().await;
        let Some(record) = table.get_mut(&id) else {
            return Ok(None);
        };
        if record.is_deleted {
            return Ok(None);
        }
        if let Some(expected) = expected_updated_at {
            if record.updated_at != expected {
                return Ok(None);
            }
        }

        record.content = content.clone();
        record.updated_by = acting_user.to_string();
        record.updated_at = next_stamp(record.updated_at, at);
        Ok(Some(record.clone()))
    }

    async fn mark_deleted(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<FundRecord>, StoreError> {
        let mut table = self.table(kind).write().await;
        match table.get_mut(&id) {
            Some(record) if !record.is_deleted => {
                record.is_deleted = true;
                record.deleted_at = Some(at);
                record.deleted_by = Some(acting_user.to_string());
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn restore_record(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<FundRecord>, StoreError> {
        let mut table = self.table(kind).write().await;
        match table.get_mut(&id) {
            Some(record) if record.is_deleted => {
                record.is_deleted = false;
                record.deleted_at = None;
                record.deleted_by = None;
                record.updated_by = acting_user.to_string();
                record.updated_at = next_stamp(record.updated_at, at);
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn purge_record(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<AuditEntry>, StoreError> {
        // Table lock is held until the audit entry is appended
        let mut table = self.table(kind).write().await;
        if !table.get(&id).is_some_and(|r| r.is_deleted) {
            return Ok(None);
        }
        let Some(record) = table.remove(&id) else {
            return Ok(None);
        };

        let entry = AuditEntry::deletion(&record, acting_user, at);
        self.audit.write().await.push(entry.clone());
        Ok(Some(entry))
    }

    async fn audit_trail(&self, kind: FundKind) -> Result<Vec<AuditEntry>, StoreError> {
        let audit = self.audit.read().await;
        let mut entries: Vec<AuditEntry> = audit
            .iter()
            .filter(|e| FundKind::from_table_name(&e.table_name) == Some(kind))
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;
    use chrono::{Duration, NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn sample(at: DateTime<Utc>) -> FundRecord {
        let content = FundContent::incoming(
            NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            Decimal::new(5000, 2),
            Source::Cash,
            None,
            None,
            "Marshall Epie".into(),
        );
        FundRecord::new(content, "Marshall Epie", at)
    }

    #[tokio::test]
    async fn update_content_respects_expected_timestamp() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2024, 2, 2, 12, 0, 0).unwrap();
        let record = store.insert_record(&sample(t0)).await.unwrap();

        let stale = t0 - Duration::seconds(5);
        let miss = store
            .update_content(FundKind::Incoming, record.id, &record.content, "Fitz Shrowder", t0 + Duration::seconds(1), Some(stale))
            .await
            .unwrap();
        assert!(miss.is_none());

        let hit = store
            .update_content(FundKind::Incoming, record.id, &record.content, "Fitz Shrowder", t0 + Duration::seconds(1), Some(t0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.updated_by, "Fitz Shrowder");
        assert_eq!(hit.updated_at, t0 + Duration::seconds(1));
    }

    #[tokio::test]
    async fn purge_only_touches_soft_deleted_rows() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2024, 2, 2, 12, 0, 0).unwrap();
        let record = store.insert_record(&sample(t0)).await.unwrap();

        assert!(store.purge_record(FundKind::Incoming, record.id, "Marshall Epie", t0).await.unwrap().is_none());
        assert_eq!(store.record_count(FundKind::Incoming).await, 1);
        assert!(store.audit_entries().await.is_empty());

        store.mark_deleted(FundKind::Incoming, record.id, "Marshall Epie", t0).await.unwrap().unwrap();
        let entry = store.purge_record(FundKind::Incoming, record.id, "Marshall Epie", t0).await.unwrap().unwrap();
        assert_eq!(entry.record_id, record.id);
        assert_eq!(store.record_count(FundKind::Incoming).await, 0);
        assert_eq!(store.audit_entries().await.len(), 1);

        assert_eq!(store.audit_trail(FundKind::Incoming).await.unwrap(), vec![entry]);
        assert!(store.audit_trail(FundKind::Outgoing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_in_the_same_millisecond_get_distinct_stamps() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2024, 2, 2, 12, 0, 0).unwrap();
        let record = store.insert_record(&sample(t0)).await.unwrap();

        let first = store
            .update_content(FundKind::Incoming, record.id, &record.content, "Fitz Shrowder", t0, Some(t0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.updated_at, t0 + Duration::milliseconds(1));

        let stale = store
            .update_content(FundKind::Incoming, record.id, &record.content, "Aruna Ramineni", t0, Some(t0))
            .await
            .unwrap();
        assert!(stale.is_none());

        store.mark_deleted(FundKind::Incoming, record.id, "Fitz Shrowder", t0).await.unwrap().unwrap();
        let restored = store
            .restore_record(FundKind::Incoming, record.id, "Fitz Shrowder", t0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(restored.updated_at, t0 + Duration::milliseconds(2));
    }

    #[tokio::test]
    async fn expired_sessions_are_swept() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2024, 2, 2, 12, 0, 0).unwrap();
        let old = Session::issue("old".into(), "Marshall Epie", now - Duration::hours(9), Duration::hours(8), None, None);
        let fresh = Session::issue("fresh".into(), "Marshall Epie", now, Duration::hours(8), None, None);
        store.insert_session(&old).await.unwrap();
        store.insert_session(&fresh).await.unwrap();

        assert_eq!(store.delete_expired_sessions(now).await.unwrap(), 1);
        assert!(store.find_session("fresh").await.unwrap().is_some());
        assert!(store.find_session("old").await.unwrap().is_none());
    }
}
