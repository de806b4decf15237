pub mod catalog;
pub mod config;
pub mod database;
mod engine;
pub mod index;
mod name;
pub mod page;
pub mod record;
pub mod shell;
pub mod store;

pub use catalog::Catalog;
pub use config::{ConfigError, ConfigResult, DuplicatePolicy, EngineConfig, LogSink, TracingSink};
pub use database::{Database, DatabaseError, DatabaseResult, ErrorKind};
pub use index::{IndexChain, IndexError, IndexResult};
pub use name::is_valid_name;
pub use page::{
    CATALOG_LABEL, ENTRY_SENTINEL, IndexPage, Owner, PAGE_CAPACITY, PageError, PageHeader,
    PageResult, RecordPage,
};
pub use record::{RecordChain, RecordError, RecordResult, WriteSummary};
pub use shell::{Command, Output, Shell, ShellError, ShellResult};
pub use store::{FileStore, MemoryStore, Message, MessageId, MessageStore, StoreError, StoreResult, StoreStats};
