use crate::page::PageError;
use crate::store::{MessageId, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Corrupted record page: {0}")]
    Page(#[from] PageError),

    #[error("Record chain loops back to message {0}")]
    Cycle(MessageId),
}

pub type RecordResult<T> = Result<T, RecordError>;
