//! SQLite Query Executor

use crate::db::{open_read_only, QueryExecutor, Row};
use crate::error::{CadetError, Result};
use crate::validation::ensure_read_only;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    db_path: PathBuf,
}

impl SqliteExecutor {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into() }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}

/// Run `sql` on a fresh read-only connection. The connection is dropped on every exit path.
pub(crate) fn run_query(db_path: &Path, sql: &str) -> Result<Vec<Row>> {
    let conn = open_read_only(db_path)?;
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            record.insert(name.clone(), to_json(row.get_ref(idx)?));
        }
        out.push(record);
    }
    Ok(out)
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>> {
        ensure_read_only(sql)?;

        let db_path = self.db_path.clone();
        let sql_owned = sql.to_string();
        let rows = tokio::task::spawn_blocking(move || run_query(&db_path, &sql_owned))
            .await
            .map_err(|e| CadetError::Execution(format!("Query task failed: {}", e)))?
            .map_err(|e| match e {
                CadetError::Database(msg) => CadetError::Execution(msg),
                other => other,
            })?;

        debug!("Query returned {} row(s)", rows.len());
        Ok(rows)
    }
}
