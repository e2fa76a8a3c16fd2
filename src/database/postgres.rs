use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::manager::DatabaseManager;
use super::record::{AuditEntry, FundContent, FundDetails, FundRecord, Visibility};
use super::{FundStore, SessionStore, StoreError};
use crate::auth::session::Session;
use crate::types::{AuditAction, Category, FundKind, Source};

const INCOMING_COLUMNS: &str = "id, date, amount, source, donor_initials, purpose_note, net_income, \
     approved_by, is_deleted, deleted_at, deleted_by, created_by, created_at, updated_by, updated_at";

const OUTGOING_COLUMNS: &str = "id, date, amount, recipient, purpose, category, \
     approved_by, is_deleted, deleted_at, deleted_by, created_by, created_at, updated_by, updated_at";

const SESSION_COLUMNS: &str =
    "session_token, user_name, created_at, expires_at, last_activity, ip_address, user_agent";

const AUDIT_COLUMNS: &str =
    "id, table_name, record_id, action, changed_by, old_values, new_values, timestamp";

fn columns(kind: FundKind) -> &'static str {
    match kind {
        FundKind::Incoming => INCOMING_COLUMNS,
        FundKind::Outgoing => OUTGOING_COLUMNS,
    }
}

/// Postgres-backed store over `auth_sessions`, the two fund tables and `audit_trail`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn record_from_row(kind: FundKind, row: &PgRow) -> Result<FundRecord, StoreError> {
    let table = kind.table_name();
    let details = match kind {
        FundKind::Incoming => {
            let source: String = row.try_get("source")?;
            FundDetails::Incoming {
                source: Source::parse(&source).ok_or_else(|| StoreError::Corrupt {
                    table,
                    message: format!("unknown source '{}'", source),
                })?,
                donor_initials: row.try_get("donor_initials")?,
                purpose_note: row.try_get("purpose_note")?,
                net_income: row.try_get("net_income")?,
            }
        }
        FundKind::Outgoing => {
            let category: String = row.try_get("category")?;
            FundDetails::Outgoing {
                recipient: row.try_get("recipient")?,
                purpose: row.try_get("purpose")?,
                category: Category::parse(&category).ok_or_else(|| StoreError::Corrupt {
                    table,
                    message: format!("unknown category '{}'", category),
                })?,
            }
        }
    };

    Ok(FundRecord {
        id: row.try_get("id")?,
        content: FundContent {
            date: row.try_get("date")?,
            amount: row.try_get("amount")?,
            details,
            approved_by: row.try_get("approved_by")?,
        },
        is_deleted: row.try_get("is_deleted")?,
        deleted_at: row.try_get("deleted_at")?,
        deleted_by: row.try_get("deleted_by")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_by: row.try_get("updated_by")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn session_from_row(row: &PgRow) -> Result<Session, StoreError> {
    Ok(Session {
        token: row.try_get("session_token")?,
        user_name: row.try_get("user_name")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
        last_activity: row.try_get("last_activity")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
    })
}

fn audit_from_row(row: &PgRow) -> Result<AuditEntry, StoreError> {
    let table_name: String = row.try_get("table_name")?;
    if FundKind::from_table_name(&table_name).is_none() {
        return Err(StoreError::Corrupt {
            table: "audit_trail",
            message: format!("unknown table '{}'", table_name),
        });
    }

    let action: String = row.try_get("action")?;
    let action = match action.as_str() {
        "DELETE" => AuditAction::Delete,
        other => {
            return Err(StoreError::Corrupt {
                table: "audit_trail",
                message: format!("unknown action '{}'", other),
            })
        }
    };
    Ok(AuditEntry {
        id: row.try_get("id")?,
        table_name,
        record_id: row.try_get("record_id")?,
        action,
        changed_by: row.try_get("changed_by")?,
        old_values: row.try_get("old_values")?,
        new_values: row.try_get::<Option<Value>, _>("new_values")?,
        timestamp: row.try_get("timestamp")?,
    })
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO auth_sessions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            SESSION_COLUMNS
        ))
        .bind(&session.token)
        .bind(&session.user_name)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.last_activity)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM auth_sessions WHERE session_token = $1",
            SESSION_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn touch_session(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE auth_sessions SET last_activity = $2 WHERE session_token = $1")
            .bind(token)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FundStore for PgStore {
    async fn insert_record(&self, record: &FundRecord) -> Result<FundRecord, StoreError> {
        let content = &record.content;
        let row = match &content.details {
            FundDetails::Incoming {
                source,
                donor_initials,
                purpose_note,
                net_income,
            } => {
                sqlx::query(&format!(
                    "INSERT INTO incoming_funds ({cols}) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
                     RETURNING {cols}",
                    cols = INCOMING_COLUMNS
                ))
                .bind(record.id)
                .bind(content.date)
                .bind(content.amount)
                .bind(source.as_str())
                .bind(donor_initials)
                .bind(purpose_note)
                .bind(net_income)
                .bind(&content.approved_by)
                .bind(record.is_deleted)
                .bind(record.deleted_at)
                .bind(&record.deleted_by)
                .bind(&record.created_by)
                .bind(record.created_at)
                .bind(&record.updated_by)
                .bind(record.updated_at)
                .fetch_one(&self.pool)
                .await?
            }
            FundDetails::Outgoing {
                recipient,
                purpose,
                category,
            } => {
                sqlx::query(&format!(
                    "INSERT INTO outgoing_funds ({cols}) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
                     RETURNING {cols}",
                    cols = OUTGOING_COLUMNS
                ))
                .bind(record.id)
                .bind(content.date)
                .bind(content.amount)
                .bind(recipient)
                .bind(purpose)
                .bind(category.as_str())
                .bind(&content.approved_by)
                .bind(record.is_deleted)
                .bind(record.deleted_at)
                .bind(&record.deleted_by)
                .bind(&record.created_by)
                .bind(record.created_at)
                .bind(&record.updated_by)
                .bind(record.updated_at)
                .fetch_one(&self.pool)
                .await?
            }
        };
        record_from_row(record.kind(), &row)
    }

    async fn get_record(&self, kind: FundKind, id: Uuid) -> Result<Option<FundRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            columns(kind),
            kind.table_name()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| record_from_row(kind, &r)).transpose()
    }

    async fn list_records(
        &self,
        kind: FundKind,
        visibility: Visibility,
    ) -> Result<Vec<FundRecord>, StoreError> {
        let (deleted, order) = match visibility {
            Visibility::Active => (false, "date DESC, created_at DESC"),
            Visibility::Deleted => (true, "deleted_at DESC"),
        };
        let rows = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE is_deleted = $1 ORDER BY {}",
            columns(kind),
            kind.table_name(),
            order
        ))
        .bind(deleted)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|r| record_from_row(kind, r)).collect()
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
        debug_assert_eq!(kind, content.kind());

        // Version check and write are one statement
        let guard = "WHERE id = $1 AND is_deleted = FALSE \
                     AND ($2::timestamptz IS NULL OR updated_at = $2)";

        let row = match &content.details {
            FundDetails::Incoming {
                source,
                donor_initials,
                purpose_note,
                net_income,
            } => {
                sqlx::query(&format!(
                    "UPDATE incoming_funds SET date = $3, amount = $4, source = $5, \
                     donor_initials = $6, purpose_note = $7, net_income = $8, approved_by = $9, \
                     updated_by = $10, updated_at = GREATEST($11, updated_at + INTERVAL '1 millisecond') \
                     {} RETURNING {}",
                    guard, INCOMING_COLUMNS
                ))
                .bind(id)
                .bind(expected_updated_at)
                .bind(content.date)
                .bind(content.amount)
                .bind(source.as_str())
                .bind(donor_initials)
                .bind(purpose_note)
                .bind(net_income)
                .bind(&content.approved_by)
                .bind(acting_user)
                .bind(at)
                .fetch_optional(&self.pool)
                .await?
            }
            FundDetails::Outgoing {
                recipient,
                purpose,
                category,
            } => {
                sqlx::query(&format!(
                    "UPDATE outgoing_funds SET date = $3, amount = $4, recipient = $5, \
                     purpose = $6, category = $7, approved_by = $8, \
                     updated_by = $9, updated_at = GREATEST($10, updated_at + INTERVAL '1 millisecond') \
                     {} RETURNING {}",
                    guard, OUTGOING_COLUMNS
                ))
                .bind(id)
                .bind(expected_updated_at)
                .bind(content.date)
                .bind(content.amount)
                .bind(recipient)
                .bind(purpose)
                .bind(category.as_str())
                .bind(&content.approved_by)
                .bind(acting_user)
                .bind(at)
                .fetch_optional(&self.pool)
                .await?
            }
        };
        row.map(|r| record_from_row(kind, &r)).transpose()
    }

    async fn mark_deleted(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<FundRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE {} SET is_deleted = TRUE, deleted_at = $2, deleted_by = $3 \
             WHERE id = $1 AND is_deleted = FALSE RETURNING {}",
            kind.table_name(),
            columns(kind)
        ))
        .bind(id)
        .bind(at)
        .bind(acting_user)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| record_from_row(kind, &r)).transpose()
    }

    async fn restore_record(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<FundRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE {} SET is_deleted = FALSE, deleted_at = NULL, deleted_by = NULL, \
             updated_by = $2, updated_at = GREATEST($3, updated_at + INTERVAL '1 millisecond') \
             WHERE id = $1 AND is_deleted = TRUE RETURNING {}",
            kind.table_name(),
            columns(kind)
        ))
        .bind(id)
        .bind(acting_user)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| record_from_row(kind, &r)).transpose()
    }

    async fn purge_record(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<AuditEntry>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 AND is_deleted = TRUE RETURNING {}",
            kind.table_name(),
            columns(kind)
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let snapshot = record_from_row(kind, &row)?;
        let entry = AuditEntry::deletion(&snapshot, acting_user, at);

        sqlx::query(&format!(
            "INSERT INTO audit_trail ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            AUDIT_COLUMNS
        ))
        .bind(entry.id)
        .bind(&entry.table_name)
        .bind(entry.record_id)
        .bind(entry.action.as_str())
        .bind(&entry.changed_by)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(entry.timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    async fn audit_trail(&self, kind: FundKind) -> Result<Vec<AuditEntry>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM audit_trail WHERE table_name = $1 ORDER BY timestamp DESC",
            AUDIT_COLUMNS
        ))
        .bind(kind.table_name())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(audit_from_row).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
