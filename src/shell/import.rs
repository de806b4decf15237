use csv::ReaderBuilder;
use serde_json::Value;
use std::io;
use std::path::Path;

use super::{ShellError, ShellResult};
use crate::database::Database;
use crate::name::is_valid_name;
use crate::store::MessageStore;

/// Insert every `key,json` row of a headerless CSV file into `db`
///
/// Returns the number of records written. Rows skipped by the duplicate
/// policy are not counted.
pub async fn import_csv<S: MessageStore>(db: &Database<S>, path: &Path) -> ShellResult<usize> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let rows = parse_rows(reader)?;
    insert_rows(db, rows).await
}

/// Same as [`import_csv`] over any reader
pub async fn import_reader<S: MessageStore, R: io::Read>(
    db: &Database<S>,
    source: R,
) -> ShellResult<usize> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);
    let rows = parse_rows(reader)?;
    insert_rows(db, rows).await
}

/// Rows are parsed up front so a bad line inserts nothing
fn parse_rows<R: io::Read>(mut reader: csv::Reader<R>) -> ShellResult<Vec<(String, Value)>> {
    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let (Some(key), Some(json)) = (record.get(0), record.get(1)) else {
            return Err(ShellError::Import {
                line: line + 1,
                message: format!("expected 2 fields, found {}", record.len()),
            });
        };
        let value: Value = serde_json::from_str(json).map_err(|e| ShellError::Import {
            line: line + 1,
            message: e.to_string(),
        })?;
        let key = key.trim();
        if !is_valid_name(key) {
            return Err(ShellError::Import {
                line: line + 1,
                message: format!("invalid key '{}'", key),
            });
        }
        rows.push((key.to_string(), value));
    }
    Ok(rows)
}

async fn insert_rows<S: MessageStore>(
    db: &Database<S>,
    rows: Vec<(String, Value)>,
) -> ShellResult<usize> {
    let mut total_inserted = 0;
    for (key, value) in rows {
        if db.insert(&key, &value).await? {
            total_inserted += 1;
        }
    }

    tracing::info!(target: "pagechain", database = db.name(), total_inserted, "CSV import done");
    Ok(total_inserted)
}
