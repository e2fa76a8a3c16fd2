use serde::Serialize;
use thiserror::Error;

/// Lifecycle of a fund record:
/// `Active --SoftDelete--> SoftDeleted --Purge--> Gone`, `SoftDeleted --Restore--> Active`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordState {
    Active,
    SoftDeleted,
    Gone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Edit,
    SoftDelete,
    Restore,
    Purge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Record is deleted; restore it before editing")]
    EditWhileDeleted,

    #[error("Record is already deleted")]
    AlreadyDeleted,

    #[error("Record is not deleted")]
    NotDeleted,

    #[error("Can only hard delete records that are already soft-deleted. Soft delete it first.")]
    NotSoftDeleted,

    #[error("Record has been permanently deleted")]
    Gone,
}

impl RecordState {
    /// The only place transitions are decided
    pub fn apply(self, action: LifecycleAction) -> Result<RecordState, LifecycleError> {
        use LifecycleAction::*;
        use RecordState::*;

        match (self, action) {
            (Active, Edit) => Ok(Active),
            (Active, SoftDelete) => Ok(SoftDeleted),
            (SoftDeleted, Restore) => Ok(Active),
            (SoftDeleted, Purge) => Ok(Gone),

            (SoftDeleted, Edit) => Err(LifecycleError::EditWhileDeleted),
            (SoftDeleted, SoftDelete) => Err(LifecycleError::AlreadyDeleted),
            (Active, Restore) => Err(LifecycleError::NotDeleted),
            (Active, Purge) => Err(LifecycleError::NotSoftDeleted),
            (Gone, _) => Err(LifecycleError::Gone),
        }
    }
}
