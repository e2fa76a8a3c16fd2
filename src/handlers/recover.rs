// POST|DELETE /api/finance/recover - deleted-records admin

use axum::{body::Bytes, extract::State, http::HeaderMap, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::utils::{decode_action, parse_json_body, require_session, required};
use crate::error::ApiResult;
use crate::types::FundKind;
use crate::AppState;

const ACTIONS: &[&str] = &["list", "restore", "hard-delete", "audit"];

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
enum RecoverRequest {
    List {
        #[serde(rename = "type")]
        kind: Option<FundKind>,
    },
    Restore {
        #[serde(rename = "type")]
        kind: Option<FundKind>,
        id: Option<Uuid>,
    },
    HardDelete {
        #[serde(rename = "type")]
        kind: Option<FundKind>,
        id: Option<Uuid>,
    },
    Audit {
        #[serde(rename = "type")]
        kind: Option<FundKind>,
    },
}

pub async fn recover(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body = parse_json_body(&body)?;
    let user = require_session(&state, &headers, &body).await?;

    match decode_action::<RecoverRequest>(body, ACTIONS)? {
        RecoverRequest::List { kind } => {
            let kind = required(kind, "type is required")?;
            let records = state.recovery.list_deleted(kind).await?;
            Ok(Json(json!({
                "success": true,
                "count": records.len(),
                "data": records,
            })))
        }

        RecoverRequest::Restore { kind, id } => {
            let (kind, id) = required(kind.zip(id), "type and id are required")?;
            let record = state.recovery.restore(kind, id, &user).await?;
            Ok(Json(json!({
                "success": true,
                "message": "Record restored",
                "record": record,
            })))
        }

        RecoverRequest::HardDelete { kind, id } => {
            let (kind, id) = required(kind.zip(id), "type and id are required")?;
            let entry = state.recovery.hard_delete(kind, id, &user).await?;
            Ok(Json(json!({
                "success": true,
                "message": "Record permanently deleted",
                "deletedRecord": entry.old_values,
            })))
        }

        RecoverRequest::Audit { kind } => {
            let kind = required(kind, "type is required")?;
            let entries = state.recovery.audit_trail(kind).await?;
            Ok(Json(json!({
                "success": true,
                "count": entries.len(),
                "data": entries,
            })))
        }
    }
}
