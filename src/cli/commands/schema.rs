use crate::cli::utils::{open_postgres, output_success};
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

pub async fn init(output_format: OutputFormat) -> anyhow::Result<()> {
    let store = open_postgres().await?;
    DatabaseManager::ensure_schema(store.pool()).await?;
    output_success(&output_format, "Database schema is up to date", None)
}
