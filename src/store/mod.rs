//! Message store interface and bundled implementations.
//!
//! A message store holds opaque text blobs addressed by identifiers it
//! assigns itself. Everything above this module only ever talks to the
//! store through [`MessageStore`].

mod error;
mod file_store;
mod memory;

pub use error::{StoreError, StoreResult};
pub use file_store::FileStore;
pub use memory::{MemoryStore, StoreStats};

use std::future::Future;

/// Identifier assigned by the store to a posted message
pub type MessageId = u64;

/// A message as returned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
}

impl Message {
    pub fn new(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Append/edit/delete text store
///
/// Implementations must fail with [`StoreError::NotFound`] when an
/// identifier is unknown or was removed. Identifiers are never reused.
pub trait MessageStore: Send + Sync {
    /// Fetch a message by id
    fn fetch(&self, id: MessageId) -> impl Future<Output = StoreResult<Message>> + Send;

    /// Post a new message, returning it with its freshly assigned id
    fn post(&self, text: String) -> impl Future<Output = StoreResult<Message>> + Send;

    /// Replace the text of an existing message in place
    fn replace(
        &self,
        id: MessageId,
        text: String,
    ) -> impl Future<Output = StoreResult<Message>> + Send;

    /// Delete a message
    fn remove(&self, id: MessageId) -> impl Future<Output = StoreResult<()>> + Send;
}
