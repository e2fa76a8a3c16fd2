use std::sync::Arc;

use crate::clock::SystemClock;
use crate::config::{self, StoreBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore};
use crate::AppState;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = Arc::new(config::config().clone());
    tracing::info!("Starting finance API in {:?} mode", config.environment);

    if config.auth.edit_password.is_empty() {
        tracing::warn!("FINANCE_EDIT_PASSWORD is not set; logins will be refused");
    }

    let clock = Arc::new(SystemClock);
    let state = match config.database.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; records are lost on restart");
            AppState::new(config.clone(), Arc::new(MemoryStore::new()), clock)
        }
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::ensure_schema(&pool).await?;
            AppState::new(config.clone(), Arc::new(PgStore::new(pool)), clock)
        }
    };

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Finance API listening on http://{}", bind_addr);
    axum::serve(listener, crate::app(state)).await?;
    Ok(())
}
