use crate::domain::task::TaskId;

/// Failures coming out of a task store. Not-found is never one of them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt task row: {0}")]
    CorruptRow(String),
    #[error("invalid task id {0}: ids are positive")]
    InvalidId(i64),
    #[error("no task ids left after {0}")]
    IdsExhausted(i64),
}

/// Explicit ids must be positive; `TaskId::UNSET` lets the store choose.
pub fn check_insert_id(id: TaskId) -> StoreResult<()> {
    if id.0 < 0 {
        return Err(StoreError::InvalidId(id.0));
    }
    Ok(())
}

pub type StoreResult<T> = Result<T, StoreError>;
