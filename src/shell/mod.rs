//! Line-oriented command shell over a catalog
//!
//! Commands are parsed by [`command::parser`] and run against the selected
//! database. Results come back as [`Output`], which renders tables with
//! prettytable.

mod command;
mod import;

pub use command::{Command, parser};
pub use import::{import_csv, import_reader};

use chumsky::Parser;
use prettytable::{Cell, Row, Table};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::database::{Database, DatabaseError};
use crate::store::MessageStore;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No database selected. Run 'use <db>' first")]
    NoDatabaseSelected,

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Import failed at line {line}: {message}")]
    Import { line: usize, message: String },

    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type ShellResult<T> = Result<T, ShellError>;

const HELP: &str = "\
databases                 list databases
create <db>               create a database
use <db>                  select a database, creating it if needed
drop <db>                 delete a database and all of its records
keys                      list keys of the selected database
get <key>                 print a value
exists <key>              check whether a key is present
insert <key> <json>       add a record
modify <key> <json>       replace the value of a record
delete <key>              remove a record
clear                     remove every record of the selected database
import <csv-path>         insert key,json rows from a headerless CSV file
help                      show this message
exit                      leave the shell";

/// Result of one shell command
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Message(String),
    Table {
        titles: Vec<&'static str>,
        rows: Vec<Vec<String>>,
    },
    Value(Value),
    Exit,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Message(message) => write!(f, "{}", message),
            Output::Table { titles, rows } => {
                let mut table = Table::new();
                table.set_titles(Row::new(titles.iter().map(|t| Cell::new(t)).collect()));
                for row in rows {
                    table.add_row(Row::new(row.iter().map(|c| Cell::new(c)).collect()));
                }
                write!(f, "{}", table)?;
                write!(f, "{} row(s)", rows.len())
            }
            Output::Value(value) => {
                let text = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
                write!(f, "{}", text)
            }
            Output::Exit => write!(f, "Bye"),
        }
    }
}

pub struct Shell<S> {
    catalog: Catalog<S>,
    current: Option<Database<S>>,
}

impl<S: MessageStore> Shell<S> {
    pub fn new(catalog: Catalog<S>) -> Self {
        Self {
            catalog,
            current: None,
        }
    }

    pub fn catalog(&self) -> &Catalog<S> {
        &self.catalog
    }

    /// Name of the selected database
    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|db| db.name())
    }

    fn selected(&self) -> ShellResult<&Database<S>> {
        self.current.as_ref().ok_or(ShellError::NoDatabaseSelected)
    }

    /// Parse and run one line
    pub async fn execute(&mut self, line: &str) -> ShellResult<Output> {
        let command = parser().parse(line).into_result().map_err(|errors| {
            ShellError::Parse(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;
        tracing::debug!(target: "pagechain", ?command, "executing");
        self.run(command).await
    }

    pub async fn run(&mut self, command: Command) -> ShellResult<Output> {
        let output = match command {
            Command::Databases => Output::Table {
                titles: vec!["Database", "Entry"],
                rows: self
                    .catalog
                    .databases()
                    .await?
                    .into_iter()
                    .map(|(name, id)| vec![name, id.to_string()])
                    .collect(),
            },
            Command::Create(name) => {
                let db = self.catalog.create_database(&name).await?;
                Output::Message(format!("Database '{}' created at {}", name, db.entry_id()))
            }
            Command::Use(name) => {
                let db = self.catalog.select_or_create(&name).await?;
                self.current = Some(db);
                Output::Message(format!("Using database '{}'", name))
            }
            Command::Drop(name) => {
                self.catalog.delete_database(&name).await?;
                if self.current() == Some(name.as_str()) {
                    self.current = None;
                }
                Output::Message(format!("Database '{}' dropped", name))
            }
            Command::Keys => Output::Table {
                titles: vec!["Key", "Page"],
                rows: self
                    .selected()?
                    .records()
                    .await?
                    .into_iter()
                    .map(|(key, id)| vec![key, id.to_string()])
                    .collect(),
            },
            Command::Get(key) => Output::Value(self.selected()?.get::<Value>(&key).await?),
            Command::Exists(key) => {
                Output::Message(self.selected()?.exists(&key).await?.to_string())
            }
            Command::Insert(key, json) => {
                let value: Value = serde_json::from_str(&json)?;
                if self.selected()?.insert(&key, &value).await? {
                    Output::Message(format!("Inserted '{}'", key))
                } else {
                    Output::Message(format!("Key '{}' already exists, skipped", key))
                }
            }
            Command::Modify(key, json) => {
                let value: Value = serde_json::from_str(&json)?;
                let summary = self.selected()?.modify(&key, &value).await?;
                Output::Message(format!("Modified '{}' ({} pages)", key, summary.pages))
            }
            Command::Delete(key) => {
                self.selected()?.delete(&key).await?;
                Output::Message(format!("Deleted '{}'", key))
            }
            Command::Clear => {
                let count = self.selected()?.clear().await?;
                Output::Message(format!("Cleared {} records", count))
            }
            Command::Import(path) => {
                let count = import_csv(self.selected()?, Path::new(&path)).await?;
                Output::Message(format!("Imported {} records", count))
            }
            Command::Help => Output::Message(HELP.to_string()),
            Command::Exit => Output::Exit,
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DuplicatePolicy, EngineConfig};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::io::Cursor;
    use tempfile::TempDir;

    async fn setup_shell() -> Shell<MemoryStore> {
        let catalog = Catalog::create(MemoryStore::new(), EngineConfig::default())
            .await
            .unwrap();
        Shell::new(catalog)
    }

    async fn message(shell: &mut Shell<MemoryStore>, line: &str) -> String {
        match shell.execute(line).await.unwrap() {
            Output::Message(message) => message,
            other => panic!("expected a message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session() {
        let mut shell = setup_shell().await;

        assert!(matches!(
            shell.execute("keys").await,
            Err(ShellError::NoDatabaseSelected)
        ));

        message(&mut shell, "use people").await;
        assert_eq!(shell.current(), Some("people"));

        message(&mut shell, r#"insert alice {"age": 30}"#).await;
        message(&mut shell, r#"modify alice {"age": 31}"#).await;
        assert_eq!(
            shell.execute("get alice").await.unwrap(),
            Output::Value(json!({"age": 31}))
        );
        assert_eq!(message(&mut shell, "exists alice").await, "true");

        let keys = shell.execute("keys").await.unwrap();
        assert!(matches!(&keys, Output::Table { rows, .. } if rows.len() == 1));
        assert!(keys.to_string().contains("alice"));

        message(&mut shell, "delete alice").await;
        assert_eq!(message(&mut shell, "exists alice").await, "false");

        message(&mut shell, "drop people").await;
        assert_eq!(shell.current(), None);
        assert_eq!(shell.execute("exit").await.unwrap(), Output::Exit);
    }

    #[tokio::test]
    async fn test_errors_are_reported() {
        let mut shell = setup_shell().await;
        message(&mut shell, "create people").await;

        assert!(matches!(
            shell.execute("create people").await,
            Err(ShellError::Database(DatabaseError::DatabaseExists(_)))
        ));
        assert!(matches!(
            shell.execute("frobnicate").await,
            Err(ShellError::Parse(_))
        ));

        message(&mut shell, "use people").await;
        assert!(matches!(
            shell.execute("insert bob {not json").await,
            Err(ShellError::Json(_))
        ));
        assert!(matches!(
            shell.execute("get bob").await,
            Err(ShellError::Database(DatabaseError::KeyNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_ignored_duplicate_is_reported_as_skipped() {
        let config = EngineConfig::default().with_duplicate_policy(DuplicatePolicy::Ignore);
        let catalog = Catalog::create(MemoryStore::new(), config).await.unwrap();
        let mut shell = Shell::new(catalog);
        message(&mut shell, "use people").await;

        assert_eq!(message(&mut shell, "insert bob 1").await, "Inserted 'bob'");
        assert_eq!(
            message(&mut shell, "insert bob 2").await,
            "Key 'bob' already exists, skipped"
        );
        assert_eq!(shell.execute("get bob").await.unwrap(), Output::Value(json!(1)));
    }

    #[tokio::test]
    async fn test_databases_table() {
        let mut shell = setup_shell().await;
        message(&mut shell, "create alpha").await;
        message(&mut shell, "create beta").await;

        match shell.execute("databases").await.unwrap() {
            Output::Table { titles, rows } => {
                assert_eq!(titles, vec!["Database", "Entry"]);
                let names: Vec<_> = rows.iter().map(|row| row[0].as_str()).collect();
                assert_eq!(names, vec!["alpha", "beta"]);
            }
            other => panic!("expected a table, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_import_reader() {
        let shell = setup_shell().await;
        let db = shell.catalog().create_database("people").await.unwrap();

        let data = "alice,\"{\"\"age\"\": 30}\"\nbob,42\ncarol,\"[1, 2]\"\n";
        assert_eq!(import_reader(&db, Cursor::new(data)).await.unwrap(), 3);
        assert_eq!(db.get::<Value>("alice").await.unwrap(), json!({"age": 30}));
        assert_eq!(db.get::<i64>("bob").await.unwrap(), 42);
        assert_eq!(db.get::<Value>("carol").await.unwrap(), json!([1, 2]));
    }

    #[tokio::test]
    async fn test_import_bad_row_inserts_nothing() {
        let shell = setup_shell().await;
        let db = shell.catalog().create_database("people").await.unwrap();

        let data = "alice,1\nbob\n";
        let err = import_reader(&db, Cursor::new(data)).await.unwrap_err();
        assert!(matches!(err, ShellError::Import { line: 2, .. }));

        let data = "alice,1\nbob,{oops\n";
        let err = import_reader(&db, Cursor::new(data)).await.unwrap_err();
        assert!(matches!(err, ShellError::Import { line: 2, .. }));

        assert!(db.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_command() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.csv");
        std::fs::write(&path, "k1,1\nk2,\"\"\"two\"\"\"\n").unwrap();

        let mut shell = setup_shell().await;
        message(&mut shell, "use data").await;
        let line = format!("import {}", path.display());
        assert_eq!(message(&mut shell, &line).await, "Imported 2 records");
        assert_eq!(
            shell.execute("get k2").await.unwrap(),
            Output::Value(json!("two"))
        );
    }
}
