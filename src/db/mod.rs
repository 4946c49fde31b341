//! Local SQLite store
//!
//! Uploaded tables live in a single SQLite file. Every collaborator here opens
//! its own connection per call and closes it before returning.

pub mod executor;
pub mod ingestion;
pub mod schema;

pub use executor::SqliteExecutor;
pub use ingestion::{ingest_csv_directory, IngestedTable};
pub use schema::SqliteSchemaProvider;

use crate::error::Result;
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

/// One result row: column name to value, in select-list order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Runs one SQL statement. `Ok` (possibly empty) is data, `Err` is a failure to feed back into repair.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>>;
}

/// Human-readable description of the store, injected into generation prompts.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn describe_schema(&self) -> Result<String>;
}

pub(crate) fn open_read_only(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

pub(crate) fn open_read_write(path: &Path) -> Result<Connection> {
    Ok(Connection::open(path)?)
}

/// User tables, skipping SQLite's internal ones.
pub(crate) fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
