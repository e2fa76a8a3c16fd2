use axum::{body::Bytes, http::HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::middleware::session_token;
use crate::AppState;

/// Body must be a JSON object; anything else is "Invalid JSON body"
pub fn parse_json_body(body: &Bytes) -> ApiResult<Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        _ => Err(ApiError::invalid_json()),
    }
}

/// Insert `action` when the caller left it out, so the typed decode sees one
pub fn with_default_action(mut body: Value, infer: impl FnOnce(&Value) -> &'static str) -> Value {
    let missing = body.get("action").map_or(true, |a| a.is_null());
    if missing {
        let action = infer(&body);
        if let Some(map) = body.as_object_mut() {
            map.insert("action".to_string(), Value::String(action.to_string()));
        }
    }
    body
}

/// Decode an action-tagged request, rejecting unknown actions with the list
/// of supported ones
pub fn decode_action<T: DeserializeOwned>(body: Value, supported: &[&str]) -> ApiResult<T> {
    let action = body.get("action").and_then(Value::as_str).unwrap_or_default();
    if !supported.contains(&action) {
        return Err(ApiError::bad_request(format!(
            "Invalid action. Supported actions: {}",
            supported.join(", ")
        )));
    }

    serde_json::from_value(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        ApiError::bad_request(format!("Invalid request: {}", e))
    })
}

/// Session gate for mutating endpoints: the acting user's name
pub async fn require_session(state: &AppState, headers: &HeaderMap, body: &Value) -> ApiResult<String> {
    let token = session_token(headers, body);
    Ok(state.auth.require_user(token.as_deref()).await?)
}

/// Unwrap a required request field or fail with `message`
pub fn required<T>(value: Option<T>, message: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::bad_request(message))
}
