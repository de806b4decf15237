use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, DuplicatePolicy};
use crate::engine::Engine;
use crate::index::IndexError;
use crate::name::is_valid_name;
use crate::page::{Owner, PageError};
use crate::record::{RecordError, WriteSummary};
use crate::store::{MessageId, MessageStore, StoreError};


#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid name '{0}'. A name can only contain A-Z, a-z, 0-9, - and _")]
    InvalidName(String),

    #[error("Database {0} already exists")]
    DatabaseExists(String),

    #[error("Database {0} not found")]
    DatabaseNotFound(String),

    #[error("Key {0} already exists")]
    KeyExists(String),

    #[error("Key {0} not found")]
    KeyNotFound(String),

    #[error("Message {0} is not a catalog root")]
    NotACatalog(MessageId),

    #[error("Stored value of {key} is not valid JSON: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot serialize value of {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Page error: {0}")]
    PageError(#[from] PageError),

    #[error("Index error: {0}")]
    IndexError(#[from] IndexError),

    #[error("Record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Coarse classification of a [`DatabaseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad name or configuration, raised before any I/O
    Validation,
    NotFound,
    AlreadyExists,
    /// Store content that does not decode as a page
    Parse,
    /// Value that is not (de)serializable JSON
    Decode,
    /// The store itself failed
    Store,
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::InvalidName(_) | DatabaseError::ConfigError(_) => ErrorKind::Validation,
            DatabaseError::DatabaseNotFound(_) | DatabaseError::KeyNotFound(_) => {
                ErrorKind::NotFound
            }
            DatabaseError::DatabaseExists(_) | DatabaseError::KeyExists(_) => {
                ErrorKind::AlreadyExists
            }
            DatabaseError::NotACatalog(_) | DatabaseError::PageError(_) => ErrorKind::Parse,
            DatabaseError::Decode { .. } | DatabaseError::Encode { .. } => ErrorKind::Decode,
            DatabaseError::StoreError(_) => ErrorKind::Store,
            DatabaseError::IndexError(err) => match err {
                IndexError::StoreError(_) => ErrorKind::Store,
                IndexError::PageError(_) | IndexError::Cycle(_) => ErrorKind::Parse,
            },
            DatabaseError::RecordError(err) => match err {
                RecordError::Store(_) => ErrorKind::Store,
                RecordError::Page(_) | RecordError::Cycle(_) => ErrorKind::Parse,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub(crate) fn check_name(name: &str) -> DatabaseResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidName(name.to_string()))
    }
}

/// Handle to one named database
///
/// The handle only remembers the name. Every operation looks the database
/// up in the catalog again, so a handle to a deleted database fails with
/// `DatabaseNotFound`.
pub struct Database<S> {
    engine: Arc<Engine<S>>,
    name: String,
    entry_id: MessageId,
}

impl<S> fmt::Debug for Database<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("entry_id", &self.entry_id)
            .finish()
    }
}

impl<S> Clone for Database<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            name: self.name.clone(),
            entry_id: self.entry_id,
        }
    }
}

impl<S: MessageStore> Database<S> {
    pub(crate) fn new(engine: Arc<Engine<S>>, name: String, entry_id: MessageId) -> Self {
        Self {
            engine,
            name,
            entry_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index head id at the time this handle was obtained
    pub fn entry_id(&self) -> MessageId {
        self.entry_id
    }

    async fn entry_point(&self) -> DatabaseResult<MessageId> {
        self.engine.entry_of(&self.name).await
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        self.engine.debug(&self.name, args);
    }

    /// Key -> head page id of every record
    pub async fn records(&self) -> DatabaseResult<BTreeMap<String, MessageId>> {
        let entry = self.entry_point().await?;
        Ok(self.engine.index().resolve(entry).await?)
    }

    /// Sorted keys
    pub async fn keys(&self) -> DatabaseResult<Vec<String>> {
        Ok(self.records().await?.into_keys().collect())
    }

    pub async fn exists(&self, key: &str) -> DatabaseResult<bool> {
        check_name(key)?;
        Ok(self.records().await?.contains_key(key))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> DatabaseResult<T> {
        check_name(key)?;
        let head = self
            .records()
            .await?
            .get(key)
            .copied()
            .ok_or_else(|| DatabaseError::KeyNotFound(key.to_string()))?;

        let text = self.engine.records().read(head).await?;
        serde_json::from_str(&text).map_err(|source| DatabaseError::Decode {
            key: key.to_string(),
            source,
        })
    }

    /// Add a new record, returning whether it was written
    ///
    /// An existing key is handled per the configured [`DuplicatePolicy`]:
    /// `Error` fails with `KeyExists`, `Ignore` returns `Ok(false)`.
    pub async fn insert<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> DatabaseResult<bool> {
        check_name(key)?;
        let entry = self.entry_point().await?;
        let records = self.engine.index().resolve(entry).await?;

        if records.contains_key(key) {
            return match self.engine.config.on_duplicate {
                DuplicatePolicy::Error => Err(DatabaseError::KeyExists(key.to_string())),
                DuplicatePolicy::Ignore => {
                    self.debug(format_args!(
                        "key '{}' already exists. Cannot be re-added",
                        key
                    ));
                    Ok(false)
                }
            };
        }

        let text = serde_json::to_string(value).map_err(|source| DatabaseError::Encode {
            key: key.to_string(),
            source,
        })?;

        let owner = Owner::new(self.name.as_str(), entry);
        let head = self.engine.records().create(key, &owner, &text).await?;
        self.engine.index().append(entry, key, head).await?;

        self.debug(format_args!("Record added: '{}' {} bytes", key, text.len()));
        Ok(true)
    }

    /// Replace the value of an existing record
    pub async fn modify<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> DatabaseResult<WriteSummary> {
        check_name(key)?;
        let entry = self.entry_point().await?;
        let head = self
            .engine
            .index()
            .resolve(entry)
            .await?
            .get(key)
            .copied()
            .ok_or_else(|| DatabaseError::KeyNotFound(key.to_string()))?;

        let text = serde_json::to_string(value).map_err(|source| DatabaseError::Encode {
            key: key.to_string(),
            source,
        })?;

        let owner = Owner::new(self.name.as_str(), entry);
        let summary = self.engine.records().write(head, &text, &owner).await?;

        self.debug(format_args!(
            "Record modified: '{}' {} bytes, {} pages (+{} -{})",
            key,
            text.len(),
            summary.pages,
            summary.created,
            summary.deleted
        ));
        Ok(summary)
    }

    pub async fn delete(&self, key: &str) -> DatabaseResult<()> {
        check_name(key)?;
        let entry = self.entry_point().await?;
        let head = self
            .engine
            .index()
            .resolve(entry)
            .await?
            .get(key)
            .copied()
            .ok_or_else(|| DatabaseError::KeyNotFound(key.to_string()))?;

        let pages = self.engine.records().delete_chain(head).await?;
        self.engine.index().remove(entry, key).await?;

        self.debug(format_args!("Record deleted: '{}' ({} pages)", key, pages));
        Ok(())
    }

    /// Delete every record, returning how many were removed
    pub async fn clear(&self) -> DatabaseResult<usize> {
        let entry = self.entry_point().await?;
        self.engine.clear_database(&self.name, entry).await
    }
}
