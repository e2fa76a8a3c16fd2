// POST /api/finance/auth - login, validate, logout

use axum::{body::Bytes, extract::State, http::HeaderMap, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::utils::{decode_action, parse_json_body, required, with_default_action};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{client_info, session_token};
use crate::services::ServiceError;
use crate::AppState;

const ACTIONS: &[&str] = &["login", "validate", "logout"];

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum AuthRequest {
    Login {
        #[serde(rename = "userName")]
        user_name: Option<String>,
        password: Option<String>,
    },
    Validate,
    Logout,
}

/// Credentials present means login; anything else is a token check
fn infer_action(body: &Value) -> &'static str {
    let has = |key: &str| body.get(key).and_then(Value::as_str).map_or(false, |s| !s.is_empty());
    if has("userName") && has("password") {
        "login"
    } else {
        "validate"
    }
}

pub async fn auth_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body = with_default_action(parse_json_body(&body)?, infer_action);
    let token = session_token(&headers, &body);

    match decode_action::<AuthRequest>(body, ACTIONS)? {
        AuthRequest::Login { user_name, password } => {
            let (user_name, password) = match (user_name, password) {
                (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
                _ => return Err(ApiError::bad_request("userName and password are required")),
            };

            let session = state.auth.login(&user_name, &password, &client_info(&headers)).await?;
            Ok(Json(json!({
                "success": true,
                "sessionToken": session.token,
                "userName": session.user_name,
                "expiresAt": session.expires_at,
            })))
        }

        AuthRequest::Validate => {
            let token = required(token, "sessionToken is required")?;
            match state.auth.validate(&token).await {
                Ok(session) => Ok(Json(json!({
                    "valid": true,
                    "userName": session.user_name,
                    "expiresAt": session.expires_at,
                }))),
                // An unknown or expired token is an answer, not a failure
                Err(ServiceError::Unauthorized(_)) => Ok(Json(json!({
                    "valid": false,
                    "error": "Session not found or expired",
                }))),
                Err(e) => Err(e.into()),
            }
        }

        AuthRequest::Logout => {
            let token = required(token, "sessionToken is required")?;
            state.auth.logout(&token).await?;
            tracing::info!("Session logged out");
            Ok(Json(json!({ "success": true })))
        }
    }
}
