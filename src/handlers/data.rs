// GET /api/finance/data?type=incoming|outgoing|summary|all - public read side

use axum::{
    extract::{Query, State},
    http::header::CACHE_CONTROL,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::services::query::Ledger;
use crate::types::FundKind;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataView {
    Table(FundKind),
    Summary,
    All,
}

impl DataView {
    fn parse(raw: Option<&str>) -> ApiResult<Self> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("all") => Ok(DataView::All),
            Some("incoming") => Ok(DataView::Table(FundKind::Incoming)),
            Some("outgoing") => Ok(DataView::Table(FundKind::Outgoing)),
            Some("summary") => Ok(DataView::Summary),
            Some(_) => Err(ApiError::bad_request(
                "Invalid type parameter. Supported types: incoming, outgoing, summary, all",
            )),
        }
    }
}

fn ledger_json(ledger: &Ledger) -> Value {
    json!({
        "data": ledger.records,
        "total": ledger.total,
    })
}

pub async fn data_get(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> ApiResult<Response> {
    let body = match DataView::parse(query.kind.as_deref())? {
        DataView::Table(kind) => {
            let ledger = state.query.ledger(kind).await?;
            json!({
                "success": true,
                "data": ledger.records,
                "summary": { "total": ledger.total, "count": ledger.count },
            })
        }
        DataView::Summary => {
            let summary = state.query.summary().await?;
            json!({
                "success": true,
                "totalNetIncome": summary.total_net_income,
                "totalOutgoing": summary.total_outgoing,
                "currentBalance": summary.current_balance,
            })
        }
        DataView::All => {
            let overview = state.query.overview().await?;
            json!({
                "success": true,
                "incoming": ledger_json(&overview.incoming),
                "outgoing": ledger_json(&overview.outgoing),
                "summary": overview.summary,
            })
        }
    };

    let cache = format!("public, max-age={}", state.config.api.data_cache_max_age_secs);
    Ok(([(CACHE_CONTROL, cache)], Json(body)).into_response())
}
