use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use super::ServiceError;
use crate::database::record::{FundRecord, Visibility};
use crate::database::{FundStore, StoreError};
use crate::types::FundKind;

/// Live rows of one table plus their counted total
#[derive(Debug, Clone, Serialize)]
pub struct Ledger {
    pub records: Vec<FundRecord>,
    pub total: Decimal,
    pub count: usize,
}

impl Ledger {
    fn from_records(kind: FundKind, records: Vec<FundRecord>) -> Result<Self, ServiceError> {
        let total = records
            .iter()
            .try_fold(Decimal::ZERO, |sum, r| sum.checked_add(r.content.counted_amount()))
            .ok_or_else(|| overflow(kind.table_name()))?;
        Ok(Self {
            count: records.len(),
            total,
            records,
        })
    }
}

fn overflow(table: &'static str) -> ServiceError {
    tracing::error!("Total of {} overflowed", table);
    ServiceError::Storage(StoreError::Corrupt {
        table,
        message: "total out of range".to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_net_income: Decimal,
    pub total_outgoing: Decimal,
    pub current_balance: Decimal,
}

impl Summary {
    fn of(incoming: &Ledger, outgoing: &Ledger) -> Result<Self, ServiceError> {
        let current_balance = incoming
            .total
            .checked_sub(outgoing.total)
            .ok_or_else(|| overflow(FundKind::Incoming.table_name()))?;
        Ok(Self {
            total_net_income: incoming.total,
            total_outgoing: outgoing.total,
            current_balance,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Overview {
    pub incoming: Ledger,
    pub outgoing: Ledger,
    pub summary: Summary,
}

/// Public read side: lists and aggregates over active rows only
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn FundStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn FundStore>) -> Self {
        Self { store }
    }

    pub async fn ledger(&self, kind: FundKind) -> Result<Ledger, ServiceError> {
        let records = self
            .store
            .list_records(kind, Visibility::Active)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching {} funds: {}", kind, e);
                ServiceError::from(e)
            })?;
        Ledger::from_records(kind, records)
    }

    pub async fn summary(&self) -> Result<Summary, ServiceError> {
        Ok(self.overview().await?.summary)
    }

    pub async fn overview(&self) -> Result<Overview, ServiceError> {
        let (incoming, outgoing) =
            tokio::try_join!(self.ledger(FundKind::Incoming), self.ledger(FundKind::Outgoing))?;
        let summary = Summary::of(&incoming, &outgoing)?;
        Ok(Overview {
            incoming,
            outgoing,
            summary,
        })
    }
}
