pub mod manager;
pub mod memory;
pub mod postgres;
pub mod record;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::session::Session;
use crate::types::FundKind;
use record::{AuditEntry, FundContent, FundRecord, Visibility};

pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors from the storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persisted table of issued session tokens
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    async fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Updates `last_activity` only; never touches `expires_at`
    async fn touch_session(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Deleting an unknown token is not an error
    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;

    /// Removes sessions with `expires_at <= now`, returns how many went
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// The two fund tables plus their audit trail.
///
/// Every state-changing method is a single conditional write: it returns
/// `None` when no row satisfied the condition and leaves the store untouched,
/// so the caller can re-read and classify the miss.
#[async_trait]
pub trait FundStore: Send + Sync {
    async fn insert_record(&self, record: &FundRecord) -> Result<FundRecord, StoreError>;

    async fn get_record(&self, kind: FundKind, id: Uuid) -> Result<Option<FundRecord>, StoreError>;

    async fn list_records(
        &self,
        kind: FundKind,
        visibility: Visibility,
    ) -> Result<Vec<FundRecord>, StoreError>;

    /// Replaces content of an active row, and only when `expected_updated_at`
    /// (if given) still equals the stored `updated_at`
    async fn update_content(
        &self,
        kind: FundKind,
        id: Uuid,
        content: &FundContent,
        acting_user: &str,
        at: DateTime<Utc>,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<Option<FundRecord>, StoreError>;

    /// Active -> SoftDeleted
    async fn mark_deleted(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<FundRecord>, StoreError>;

    /// SoftDeleted -> Active
    async fn restore_record(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<FundRecord>, StoreError>;

    /// SoftDeleted -> Gone. Removes the row and appends its audit entry atomically.
    async fn purge_record(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<AuditEntry>, StoreError>;

    /// Audit entries for one table, newest first
    async fn audit_trail(&self, kind: FundKind) -> Result<Vec<AuditEntry>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
