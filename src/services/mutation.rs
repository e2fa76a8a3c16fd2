use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::lifecycle::LifecycleAction;
use super::validation::parse_content;
use super::ServiceError;
use crate::clock::Clock;
use crate::database::record::FundRecord;
use crate::database::FundStore;
use crate::types::FundKind;

/// Per-item failure inside a batch, by position in the submitted list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItemError {
    pub index: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub processed: usize,
    pub errors: Vec<BatchItemError>,
}

/// Create, update, soft-delete and batch-create against the two fund tables
#[derive(Clone)]
pub struct MutationService {
    store: Arc<dyn FundStore>,
    clock: Arc<dyn Clock>,
}

impl MutationService {
    pub fn new(store: Arc<dyn FundStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(
        &self,
        kind: FundKind,
        data: &Value,
        acting_user: &str,
    ) -> Result<FundRecord, ServiceError> {
        let content = parse_content(kind, data).map_err(ServiceError::Validation)?;
        let record = FundRecord::new(content, acting_user, self.clock.now());

        let created = self.store.insert_record(&record).await.map_err(|e| {
            tracing::error!("Error creating {} record: {}", kind, e);
            ServiceError::from(e)
        })?;
        tracing::info!("Created {} record {} by '{}'", kind, created.id, acting_user);
        Ok(created)
    }

    /// Replace a record's content.
    ///
    /// With `expected_updated_at` the write only lands if the stored
    /// `updated_at` still matches; otherwise the current record comes back in
    /// `ServiceError::Conflict` and nothing is written.
    pub async fn update(
        &self,
        kind: FundKind,
        id: Uuid,
        data: &Value,
        acting_user: &str,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<FundRecord, ServiceError> {
        let content = parse_content(kind, data).map_err(ServiceError::Validation)?;

        let written = self
            .store
            .update_content(kind, id, &content, acting_user, self.clock.now(), expected_updated_at)
            .await
            .map_err(|e| {
                tracing::error!("Error updating {} record {}: {}", kind, id, e);
                ServiceError::from(e)
            })?;

        if let Some(record) = written {
            tracing::info!("Updated {} record {} by '{}'", kind, id, acting_user);
            return Ok(record);
        }

        // Nothing matched: missing, deleted, or someone else got there first
        let current = self.store.get_record(kind, id).await?.ok_or(ServiceError::NotFound)?;
        current.state().apply(LifecycleAction::Edit)?;
        tracing::warn!(
            "Update conflict on {} record {}: expected {:?}, found {}",
            kind,
            id,
            expected_updated_at,
            current.updated_at
        );
        Err(ServiceError::Conflict(Box::new(current)))
    }

    pub async fn soft_delete(
        &self,
        kind: FundKind,
        id: Uuid,
        acting_user: &str,
    ) -> Result<FundRecord, ServiceError> {
        let current = self.store.get_record(kind, id).await?.ok_or(ServiceError::NotFound)?;
        current.state().apply(LifecycleAction::SoftDelete)?;

        match self.store.mark_deleted(kind, id, acting_user, self.clock.now()).await? {
            Some(record) => {
                tracing::info!("Soft deleted {} record {} by '{}'", kind, id, acting_user);
                Ok(record)
            }
            None => {
                // Lost a race between the read and the write
                let current = self.store.get_record(kind, id).await?.ok_or(ServiceError::NotFound)?;
                current.state().apply(LifecycleAction::SoftDelete)?;
                Err(ServiceError::Conflict(Box::new(current)))
            }
        }
    }

    /// Validate and insert each item in order. A failing item is skipped and
    /// reported by index; the rest still land.
    pub async fn batch_create(
        &self,
        kind: FundKind,
        items: &[Value],
        acting_user: &str,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            processed: 0,
            errors: Vec::new(),
        };

        for (index, item) in items.iter().enumerate() {
            match self.create(kind, item, acting_user).await {
                Ok(_) => outcome.processed += 1,
                Err(ServiceError::Validation(errors)) => outcome.errors.push(BatchItemError {
                    index,
                    errors: errors.iter().map(|e| e.to_string()).collect(),
                }),
                Err(_) => outcome.errors.push(BatchItemError {
                    index,
                    errors: vec!["Failed to create record".to_string()],
                }),
            }
        }

        tracing::info!(
            "Batch create on {}: {}/{} processed by '{}'",
            kind,
            outcome.processed,
            items.len(),
            acting_user
        );
        outcome
    }
}
