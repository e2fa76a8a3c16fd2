//! Bulk load of spreadsheet rows exported from the old ledger.
//!
//! Rows are positional cell arrays. Each one is normalised into the same JSON
//! shape the mutate endpoint accepts and then goes through the normal create
//! path, so validation and net-income derivation are identical.

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{MutationService, ServiceError};
use crate::types::FundKind;

pub const INCOMING_COLUMNS: usize = 7;
pub const OUTGOING_COLUMNS: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub incoming_processed: usize,
    pub outgoing_processed: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn message(&self) -> String {
        format!(
            "Migration completed. Processed {} incoming and {} outgoing records.",
            self.incoming_processed, self.outgoing_processed
        )
    }
}

#[derive(Clone)]
pub struct SheetImporter {
    mutations: MutationService,
}

impl SheetImporter {
    pub fn new(mutations: MutationService) -> Self {
        Self { mutations }
    }

    /// Import both sheets. Row failures are collected, never fatal.
    pub async fn import(
        &self,
        incoming: Option<&[Value]>,
        outgoing: Option<&[Value]>,
        acting_user: &str,
    ) -> Result<ImportReport, ServiceError> {
        if incoming.is_none() && outgoing.is_none() {
            return Err(ServiceError::BadRequest(
                "At least one of incomingData or outgoingData must be provided as an array".to_string(),
            ));
        }

        let mut report = ImportReport::default();
        if let Some(rows) = incoming {
            tracing::info!("Migrating {} incoming rows", rows.len());
            report.incoming_processed = self
                .import_sheet(FundKind::Incoming, rows, acting_user, &mut report.errors)
                .await;
        }
        if let Some(rows) = outgoing {
            tracing::info!("Migrating {} outgoing rows", rows.len());
            report.outgoing_processed = self
                .import_sheet(FundKind::Outgoing, rows, acting_user, &mut report.errors)
                .await;
        }

        tracing::info!(
            "Migration by '{}': {} incoming, {} outgoing, {} errors",
            acting_user,
            report.incoming_processed,
            report.outgoing_processed,
            report.errors.len()
        );
        Ok(report)
    }

    async fn import_sheet(
        &self,
        kind: FundKind,
        rows: &[Value],
        acting_user: &str,
        errors: &mut Vec<String>,
    ) -> usize {
        let mut processed = 0;

        for (i, row) in rows.iter().enumerate() {
            let row_no = i + 1;
            // Blank rows are skipped; a row that is not a cell list has no columns
            let cells = match row {
                Value::Null => continue,
                Value::Array(cells) => {
                    let cells: Vec<String> = cells.iter().map(cell_text).collect();
                    if cells.iter().all(|c| c.is_empty()) {
                        continue;
                    }
                    cells
                }
                _ => Vec::new(),
            };

            let data = match row_to_record(kind, &cells) {
                Some(data) => data,
                None => {
                    errors.push(format!(
                        "Row {}: Insufficient columns (expected {})",
                        row_no,
                        expected_columns(kind)
                    ));
                    continue;
                }
            };

            match self.mutations.create(kind, &data, acting_user).await {
                Ok(_) => processed += 1,
                Err(ServiceError::Validation(field_errors)) => {
                    errors.extend(field_errors.iter().map(|e| format!("Row {}: {}", row_no, e)));
                }
                Err(e) => {
                    tracing::warn!("Row {} ({}) failed to import: {}", row_no, kind, e);
                    errors.push(format!("Row {} ({}): Failed to create record", row_no, kind));
                }
            }
        }

        processed
    }
}

fn expected_columns(kind: FundKind) -> usize {
    match kind {
        FundKind::Incoming => INCOMING_COLUMNS,
        FundKind::Outgoing => OUTGOING_COLUMNS,
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Build the create payload for one row, or `None` when it is too short
fn row_to_record(kind: FundKind, cells: &[String]) -> Option<Value> {
    if cells.len() < expected_columns(kind) {
        return None;
    }

    let mut data = Map::new();
    data.insert("date".into(), json!(normalize_date(&cells[0])));
    data.insert("amount".into(), json!(clean_amount(&cells[1])));

    match kind {
        FundKind::Incoming => {
            // cells[4] is the sheet's own net income; it is always re-derived
            data.insert("source".into(), json!(cells[2]));
            data.insert("donor_initials".into(), non_empty(&cells[3]));
            data.insert("purpose_note".into(), non_empty(&cells[5]));
            data.insert("approved_by".into(), json!(cells[6]));
        }
        FundKind::Outgoing => {
            data.insert("recipient".into(), json!(cells[2]));
            data.insert("purpose".into(), json!(cells[3]));
            data.insert("category".into(), json!(cells[4]));
            data.insert("approved_by".into(), json!(cells[5]));
        }
    }

    Some(Value::Object(data))
}

fn non_empty(cell: &str) -> Value {
    if cell.is_empty() {
        Value::Null
    } else {
        json!(cell)
    }
}

/// `DD-MM-YYYY` (day and month may be single digits) becomes `YYYY-MM-DD`;
/// anything else passes through for the validator to judge.
pub fn normalize_date(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('-').collect();
    match parts.as_slice() {
        [day, month, year] if day.len() <= 2 && month.len() <= 2 && year.len() == 4 => {
            format!("{}-{:0>2}-{:0>2}", year, month, day)
        }
        _ => raw.to_string(),
    }
}

/// Strip currency symbols, thousands separators and whitespace
pub fn clean_amount(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '£' | '$' | ',') && !c.is_whitespace())
        .collect()
}
