use thiserror::Error;

use crate::database::record::FundRecord;
use crate::database::StoreError;
use crate::services::lifecycle::LifecycleError;
use crate::services::validation::FieldError;

/// Failures of the session and record operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Too many login attempts. Please try again later.")]
    RateLimited,

    /// Optimistic-lock mismatch; carries the current server-side record
    #[error("Record was modified by another user")]
    Conflict(Box<FundRecord>),

    #[error("Record not found")]
    NotFound,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("{0}")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Storage(#[from] StoreError),
}
