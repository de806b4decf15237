//! Database catalog
//!
//! The catalog is an index chain rooted at the bootstrap entry point that
//! maps database names to the head of each database's key index.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{DebugLog, EngineConfig, LogSink, TracingSink};
use crate::database::{Database, DatabaseError, DatabaseResult, check_name};
use crate::engine::Engine;
use crate::page::{CATALOG_LABEL, ENTRY_SENTINEL, IndexPage};
use crate::store::{MessageId, MessageStore};

const SCOPE: &str = "catalog";

pub struct Catalog<S> {
    engine: Arc<Engine<S>>,
}

impl<S: MessageStore> Catalog<S> {
    /// Open the catalog rooted at `root`, logging through `tracing`
    pub async fn open(store: S, root: MessageId, config: EngineConfig) -> DatabaseResult<Self> {
        Self::open_with_sink(store, root, config, Arc::new(TracingSink)).await
    }

    /// Open the catalog rooted at `root`
    ///
    /// A root that still holds the uninitialized sentinel is turned into an
    /// empty catalog page. Any other root must already be a catalog page.
    pub async fn open_with_sink(
        store: S,
        root: MessageId,
        config: EngineConfig,
        sink: Arc<dyn LogSink>,
    ) -> DatabaseResult<Self> {
        config.validate()?;
        let log = DebugLog::new(config.debug, sink);
        let engine = Engine::new(store, root, config, log);

        let message = engine.store.fetch(root).await?;
        if message.text.trim().eq_ignore_ascii_case(ENTRY_SENTINEL) {
            engine.debug(SCOPE, format_args!("Initiating new catalog at {}", root));
            engine
                .store
                .replace(root, IndexPage::empty(CATALOG_LABEL).encode())
                .await?;
        } else {
            let page = IndexPage::decode(&message.text)?;
            if page.header.label != CATALOG_LABEL || page.header.page_index != 0 {
                return Err(DatabaseError::NotACatalog(root));
            }
            engine.debug(SCOPE, format_args!("Connected to catalog at {}", root));
        }

        Ok(Self {
            engine: Arc::new(engine),
        })
    }

    /// Post a fresh entry point to `store` and open it
    pub async fn create(store: S, config: EngineConfig) -> DatabaseResult<Self> {
        let message = store.post(ENTRY_SENTINEL.to_string()).await?;
        Self::open(store, message.id, config).await
    }

    pub fn root_id(&self) -> MessageId {
        self.engine.root
    }

    pub fn store(&self) -> &S {
        &self.engine.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.engine.config
    }

    /// Database name -> index head id
    pub async fn databases(&self) -> DatabaseResult<BTreeMap<String, MessageId>> {
        self.engine.databases().await
    }

    /// Sorted database names
    pub async fn names(&self) -> DatabaseResult<Vec<String>> {
        Ok(self.databases().await?.into_keys().collect())
    }

    pub async fn create_database(&self, name: &str) -> DatabaseResult<Database<S>> {
        check_name(name)?;
        if self.databases().await?.contains_key(name) {
            self.engine
                .debug(SCOPE, format_args!("Database '{}' already exists!", name));
            return Err(DatabaseError::DatabaseExists(name.to_string()));
        }

        let entry = self.engine.index().create(name).await?;
        self.engine
            .index()
            .append(self.engine.root, name, entry)
            .await?;

        self.engine
            .debug(SCOPE, format_args!("Created database '{}' at {}", name, entry));
        Ok(Database::new(Arc::clone(&self.engine), name.to_string(), entry))
    }

    /// Select an existing database
    pub async fn database(&self, name: &str) -> DatabaseResult<Database<S>> {
        check_name(name)?;
        let entry = self.engine.entry_of(name).await?;
        Ok(Database::new(Arc::clone(&self.engine), name.to_string(), entry))
    }

    /// Select a database, creating it when it does not exist yet
    pub async fn select_or_create(&self, name: &str) -> DatabaseResult<Database<S>> {
        check_name(name)?;
        match self.databases().await?.get(name) {
            Some(&entry) => Ok(Database::new(
                Arc::clone(&self.engine),
                name.to_string(),
                entry,
            )),
            None => {
                self.engine.debug(
                    SCOPE,
                    format_args!("Database '{}' does not exist. Creating...", name),
                );
                self.create_database(name).await
            }
        }
    }

    /// Delete a database with all of its records
    ///
    /// Record chains go first, then the catalog entry, then every page of
    /// the database's own index. A failure part way leaves at worst
    /// unreachable pages, never a catalog entry pointing at a deleted page.
    pub async fn delete_database(&self, name: &str) -> DatabaseResult<()> {
        check_name(name)?;
        let entry = self.engine.entry_of(name).await?;

        let records = self.engine.delete_records(entry).await?;
        self.engine.index().remove(self.engine.root, name).await?;
        self.engine.index().delete_chain(entry).await?;

        self.engine.debug(
            SCOPE,
            format_args!("Deleted database '{}' with {} records", name, records),
        );
        Ok(())
    }
}
