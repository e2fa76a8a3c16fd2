use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::{self, StoreBackend};
use crate::database::{DatabaseManager, PgStore};

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(map), Some(Value::Object(data))) = (response.as_object_mut(), data) {
                map.extend(data);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Maintenance commands only make sense against the durable store
pub async fn open_postgres() -> anyhow::Result<PgStore> {
    let config = config::config();
    if config.database.backend != StoreBackend::Postgres {
        anyhow::bail!("This command needs STORE_BACKEND=postgres and DATABASE_URL");
    }
    let pool = DatabaseManager::connect(&config.database).await?;
    Ok(PgStore::new(pool))
}
