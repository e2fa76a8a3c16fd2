use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::services::lifecycle::RecordState;
use crate::types::{AuditAction, Category, FundKind, Source};

/// Share of a GoFundMe donation that reaches the organisation (3.31% platform fee)
pub const GOFUNDME_NET_RATE: Decimal = Decimal::from_parts(9669, 0, 0, false, 4);

/// Amount left after provider fees. Only GoFundMe deducts anything.
pub fn net_income(amount: Decimal, source: Source) -> Decimal {
    match source {
        Source::GoFundMe => (amount * GOFUNDME_NET_RATE)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        _ => amount,
    }
}

/// Columns that differ between the two tables
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FundDetails {
    Incoming {
        source: Source,
        donor_initials: Option<String>,
        purpose_note: Option<String>,
        net_income: Decimal,
    },
    Outgoing {
        recipient: String,
        purpose: String,
        category: Category,
    },
}

impl FundDetails {
    pub fn kind(&self) -> FundKind {
        match self {
            FundDetails::Incoming { .. } => FundKind::Incoming,
            FundDetails::Outgoing { .. } => FundKind::Outgoing,
        }
    }
}

/// Validated, user-editable content of a fund record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundContent {
    pub date: NaiveDate,
    pub amount: Decimal,
    #[serde(flatten)]
    pub details: FundDetails,
    pub approved_by: String,
}

impl FundContent {
    pub fn incoming(
        date: NaiveDate,
        amount: Decimal,
        source: Source,
        donor_initials: Option<String>,
        purpose_note: Option<String>,
        approved_by: String,
    ) -> Self {
        Self {
            date,
            amount,
            details: FundDetails::Incoming {
                source,
                donor_initials,
                purpose_note,
                net_income: net_income(amount, source),
            },
            approved_by,
        }
    }

    pub fn outgoing(
        date: NaiveDate,
        amount: Decimal,
        recipient: String,
        purpose: String,
        category: Category,
        approved_by: String,
    ) -> Self {
        Self {
            date,
            amount,
            details: FundDetails::Outgoing {
                recipient,
                purpose,
                category,
            },
            approved_by,
        }
    }

    pub fn kind(&self) -> FundKind {
        self.details.kind()
    }

    /// Value that counts towards the table total: net income in, amount out
    pub fn counted_amount(&self) -> Decimal {
        match &self.details {
            FundDetails::Incoming { net_income, .. } => *net_income,
            FundDetails::Outgoing { .. } => self.amount,
        }
    }
}

/// A persisted row of `incoming_funds` or `outgoing_funds`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub content: FundContent,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl FundRecord {
    /// Fresh active record stamped with the acting user
    pub fn new(content: FundContent, acting_user: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_by: acting_user.to_string(),
            created_at: at,
            updated_by: acting_user.to_string(),
            updated_at: at,
        }
    }

    pub fn kind(&self) -> FundKind {
        self.content.kind()
    }

    pub fn state(&self) -> RecordState {
        if self.is_deleted {
            RecordState::SoftDeleted
        } else {
            RecordState::Active
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Append-only evidence of a destructive operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub table_name: String,
    pub record_id: Uuid,
    pub action: AuditAction,
    pub changed_by: String,
    pub old_values: Value,
    pub new_values: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Entry for a permanently removed row, carrying its last snapshot
    pub fn deletion(record: &FundRecord, changed_by: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            table_name: record.kind().table_name().to_string(),
            record_id: record.id,
            action: AuditAction::Delete,
            changed_by: changed_by.to_string(),
            old_values: record.to_json(),
            new_values: None,
            timestamp: at,
        }
    }
}

/// Which rows a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Live rows, newest `date` first
    Active,
    /// Soft-deleted rows, most recently deleted first
    Deleted,
}
