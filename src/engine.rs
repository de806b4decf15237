use std::collections::BTreeMap;
use std::fmt;

use crate::config::{DebugLog, EngineConfig};
use crate::database::{DatabaseError, DatabaseResult};
use crate::index::IndexChain;
use crate::record::RecordChain;
use crate::store::{MessageId, MessageStore};

/// State shared by a catalog and every database handle it hands out
///
/// Holds only the store, the root id and settings. Indexes are resolved
/// from the store on every call.
pub(crate) struct Engine<S> {
    pub(crate) store: S,
    pub(crate) root: MessageId,
    pub(crate) config: EngineConfig,
    log: DebugLog,
}

impl<S: MessageStore> Engine<S> {
    pub(crate) fn new(store: S, root: MessageId, config: EngineConfig, log: DebugLog) -> Self {
        Self {
            store,
            root,
            config,
            log,
        }
    }

    pub(crate) fn index(&self) -> IndexChain<'_, S> {
        IndexChain::new(&self.store, self.config.page_capacity)
    }

    pub(crate) fn records(&self) -> RecordChain<'_, S> {
        RecordChain::new(&self.store, self.config.page_capacity)
    }

    pub(crate) fn debug(&self, scope: &str, args: fmt::Arguments<'_>) {
        self.log.log(scope, args);
    }

    /// Database name -> head of its key index
    pub(crate) async fn databases(&self) -> DatabaseResult<BTreeMap<String, MessageId>> {
        Ok(self.index().resolve(self.root).await?)
    }

    /// Current index head of database `name`
    pub(crate) async fn entry_of(&self, name: &str) -> DatabaseResult<MessageId> {
        self.databases()
            .await?
            .get(name)
            .copied()
            .ok_or_else(|| DatabaseError::DatabaseNotFound(name.to_string()))
    }

    /// Delete the record chain of every key in the index at `entry`,
    /// leaving the index itself untouched. Returns the number of records.
    pub(crate) async fn delete_records(&self, entry: MessageId) -> DatabaseResult<usize> {
        let records = self.index().resolve(entry).await?;
        let chain = self.records();
        for head in records.values() {
            chain.delete_chain(*head).await?;
        }
        Ok(records.len())
    }

    /// Delete every record of a database and shrink its index to one empty
    /// page. Returns the number of records removed.
    pub(crate) async fn clear_database(&self, name: &str, entry: MessageId) -> DatabaseResult<usize> {
        let records = self.delete_records(entry).await?;
        let dropped_pages = self.index().truncate(entry).await?;
        self.debug(
            name,
            format_args!(
                "Cleared {} records, dropped {} index pages",
                records, dropped_pages
            ),
        );
        Ok(records)
    }
}
