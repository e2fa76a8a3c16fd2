use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "MePie Finance API",
            "version": version,
            "description": "Session-gated ledger of incoming and outgoing funds",
            "endpoints": {
                "auth": "POST /api/finance/auth (login, validate, logout)",
                "data": "GET /api/finance/data?type=incoming|outgoing|summary|all (public)",
                "mutate": "POST|PUT|DELETE /api/finance/mutate (create, update, delete, batch)",
                "recover": "POST|DELETE /api/finance/recover (list, restore, hard-delete, audit)",
                "migrate": "POST /api/finance/migrate (spreadsheet import)",
                "health": "GET /health",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.funds.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

/// CORS preflight: empty 204, headers come from the CORS layers
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
