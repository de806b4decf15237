use std::io;
use thiserror::Error;

use super::MessageId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Message not found: id={0}")]
    NotFound(MessageId),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
