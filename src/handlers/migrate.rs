// POST /api/finance/migrate - bulk import of spreadsheet rows

use axum::{body::Bytes, extract::State, http::HeaderMap, response::Json};
use serde_json::{json, Value};

use super::utils::{parse_json_body, require_session};
use crate::error::ApiResult;
use crate::AppState;

pub async fn migrate_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body = parse_json_body(&body)?;
    let user = require_session(&state, &headers, &body).await?;

    let report = state
        .importer
        .import(rows(&body, "incomingData"), rows(&body, "outgoingData"), &user)
        .await?;

    Ok(Json(json!({
        "success": true,
        "incomingProcessed": report.incoming_processed,
        "outgoingProcessed": report.outgoing_processed,
        "message": report.message(),
        "errors": report.errors,
    })))
}

/// A sheet is present only when sent as an array of rows
fn rows<'a>(body: &'a Value, key: &str) -> Option<&'a [Value]> {
    body.get(key).and_then(Value::as_array).map(Vec::as_slice)
}
