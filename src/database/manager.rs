use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use super::StoreError;
use crate::config::DatabaseConfig;

/// Idempotent DDL for the four tables, applied one statement at a time
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS auth_sessions (
        session_token TEXT PRIMARY KEY,
        user_name     TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        expires_at    TIMESTAMPTZ NOT NULL,
        last_activity TIMESTAMPTZ NOT NULL,
        ip_address    TEXT,
        user_agent    TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS auth_sessions_expires_at_idx ON auth_sessions (expires_at)",
    r#"
    CREATE TABLE IF NOT EXISTS incoming_funds (
        id             UUID PRIMARY KEY,
        date           DATE NOT NULL,
        amount         NUMERIC(14, 2) NOT NULL CHECK (amount >= 0),
        source         TEXT NOT NULL,
        donor_initials TEXT,
        purpose_note   TEXT,
        net_income     NUMERIC(14, 2) NOT NULL,
        approved_by    TEXT NOT NULL,
        is_deleted     BOOLEAN NOT NULL DEFAULT FALSE,
        deleted_at     TIMESTAMPTZ,
        deleted_by     TEXT,
        created_by     TEXT NOT NULL,
        created_at     TIMESTAMPTZ NOT NULL,
        updated_by     TEXT NOT NULL,
        updated_at     TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS outgoing_funds (
        id          UUID PRIMARY KEY,
        date        DATE NOT NULL,
        amount      NUMERIC(14, 2) NOT NULL CHECK (amount >= 0),
        recipient   TEXT NOT NULL,
        purpose     TEXT NOT NULL,
        category    TEXT NOT NULL,
        approved_by TEXT NOT NULL,
        is_deleted  BOOLEAN NOT NULL DEFAULT FALSE,
        deleted_at  TIMESTAMPTZ,
        deleted_by  TEXT,
        created_by  TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_by  TEXT NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_trail (
        id         UUID PRIMARY KEY,
        table_name TEXT NOT NULL,
        record_id  UUID NOT NULL,
        action     TEXT NOT NULL,
        changed_by TEXT NOT NULL,
        old_values JSONB NOT NULL,
        new_values JSONB,
        timestamp  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS audit_trail_table_idx ON audit_trail (table_name, timestamp DESC)",
];

/// Connection pool setup and schema bootstrap for the Postgres backend
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool against `DATABASE_URL`
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool ({} max connections)", config.max_connections);
        Ok(pool)
    }

    /// Create missing tables and indexes
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Database schema verified");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, StoreBackend};

    #[tokio::test]
    async fn connect_requires_database_url() {
        let mut config = AppConfig::development().database;
        config.backend = StoreBackend::Postgres;
        config.url = None;

        let err = DatabaseManager::connect(&config).await.unwrap_err();
        assert!(matches!(err, StoreError::ConfigMissing("DATABASE_URL")));
    }

    #[test]
    fn schema_covers_every_table() {
        let ddl = SCHEMA.join("\n");
        for table in ["auth_sessions", "incoming_funds", "outgoing_funds", "audit_trail"] {
            assert!(ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)), "missing {}", table);
        }
    }
}
