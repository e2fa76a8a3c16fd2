// POST|PUT|DELETE /api/finance/mutate - create, update, delete, batch

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::utils::{decode_action, parse_json_body, require_session, required, with_default_action};
use crate::error::ApiResult;
use crate::types::FundKind;
use crate::AppState;

const ACTIONS: &[&str] = &["create", "post", "update", "put", "delete", "batch"];

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum MutateRequest {
    #[serde(alias = "post")]
    Create {
        #[serde(rename = "type")]
        kind: Option<FundKind>,
        data: Option<Value>,
    },
    #[serde(alias = "put")]
    Update {
        #[serde(rename = "type")]
        kind: Option<FundKind>,
        id: Option<Uuid>,
        data: Option<Value>,
        #[serde(rename = "expectedUpdatedAt")]
        expected_updated_at: Option<DateTime<Utc>>,
    },
    Delete {
        #[serde(rename = "type")]
        kind: Option<FundKind>,
        id: Option<Uuid>,
    },
    Batch {
        #[serde(rename = "type")]
        kind: Option<FundKind>,
        operations: Option<Vec<Value>>,
    },
}

fn action_for(method: &Method) -> &'static str {
    match *method {
        Method::PUT => "update",
        Method::DELETE => "delete",
        _ => "create",
    }
}

pub async fn mutate(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let body = parse_json_body(&body)?;
    let user = require_session(&state, &headers, &body).await?;
    let body = with_default_action(body, |_| action_for(&method));

    match decode_action::<MutateRequest>(body, ACTIONS)? {
        MutateRequest::Create { kind, data } => {
            let (kind, data) = required(kind.zip(data), "type and data are required")?;
            let record = state.mutations.create(kind, &data, &user).await?;
            Ok((
                StatusCode::CREATED,
                Json(json!({ "success": true, "id": record.id, "record": record })),
            ))
        }

        MutateRequest::Update {
            kind,
            id,
            data,
            expected_updated_at,
        } => {
            let ((kind, id), data) = required(kind.zip(id).zip(data), "type, id, and data are required")?;
            let record = state
                .mutations
                .update(kind, id, &data, &user, expected_updated_at)
                .await?;
            Ok((StatusCode::OK, Json(json!({ "success": true, "record": record }))))
        }

        MutateRequest::Delete { kind, id } => {
            let (kind, id) = required(kind.zip(id), "type and id are required")?;
            let record = state.mutations.soft_delete(kind, id, &user).await?;
            Ok((StatusCode::OK, Json(json!({ "success": true, "record": record }))))
        }

        MutateRequest::Batch { kind, operations } => {
            let (kind, operations) = required(kind.zip(operations), "type and operations array are required")?;
            let outcome = state.mutations.batch_create(kind, &operations, &user).await;
            Ok((
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "processed": outcome.processed,
                    "errors": outcome.errors,
                })),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_picks_the_default_action() {
        assert_eq!(action_for(&Method::POST), "create");
        assert_eq!(action_for(&Method::PUT), "update");
        assert_eq!(action_for(&Method::DELETE), "delete");
    }

    #[test]
    fn legacy_method_names_decode_as_actions() {
        let request: MutateRequest = decode_action(
            json!({"action": "put", "type": "incoming", "id": Uuid::nil(), "data": {}}),
            ACTIONS,
        )
        .unwrap();
        assert!(matches!(request, MutateRequest::Update { kind: Some(FundKind::Incoming), .. }));
    }
}
