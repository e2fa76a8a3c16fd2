use axum::http::HeaderMap;
use serde_json::Value;

/// Session token from the JSON body (`sessionToken`), falling back to an
/// `Authorization: Bearer` header
pub fn session_token(headers: &HeaderMap, body: &Value) -> Option<String> {
    body.get("sessionToken")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .or_else(|| extract_bearer_from_headers(headers).ok())
}

/// Extract a bearer token from the Authorization header
pub fn extract_bearer_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
