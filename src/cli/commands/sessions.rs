use serde_json::json;

use crate::cli::utils::{open_postgres, output_success};
use crate::cli::OutputFormat;
use crate::clock::{Clock, SystemClock};
use crate::database::SessionStore;

pub async fn sweep(output_format: OutputFormat) -> anyhow::Result<()> {
    let store = open_postgres().await?;
    let removed = store.delete_expired_sessions(SystemClock.now()).await?;

    output_success(
        &output_format,
        &format!("Removed {} expired sessions", removed),
        Some(json!({ "removed": removed })),
    )
}
