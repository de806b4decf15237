use thiserror::Error;

use crate::page::PageError;
use crate::store::{MessageId, StoreError};

/// Result type for index chain operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while walking or rewriting an index chain
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Corrupted index page: {0}")]
    PageError(#[from] PageError),

    #[error("Index chain loops back to message {0}")]
    Cycle(MessageId),
}
