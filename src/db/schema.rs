//! Schema Description
//!
//! Renders tables, column types, one sample row per table and naive join
//! hints into the text block the generator sees.

use crate::db::executor::run_query;
use crate::db::{list_tables, open_read_only, quote_ident, SchemaProvider};
use crate::error::{CadetError, Result};
use async_trait::async_trait;
use itertools::Itertools;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const SAMPLE_ROWS: usize = 3;
pub const RELATIONSHIPS_HEADER: &str = "--- Inferred Relationships (JOIN Hints) ---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone)]
pub struct SqliteSchemaProvider {
    db_path: PathBuf,
}

impl SqliteSchemaProvider {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into() }
    }
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get::<_, String>(1)?,
                data_type: row.get::<_, String>(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// `customer_id` in `orders` links to the first other table whose name contains `customer`.
pub fn infer_relationships(tables: &[(String, Vec<ColumnInfo>)]) -> Vec<String> {
    let mut links = Vec::new();
    for (table, columns) in tables {
        for column in columns {
            let col_name = column.name.to_lowercase();
            if !col_name.ends_with("id") || col_name == "id" {
                continue;
            }
            let base = col_name.replace("_id", "").replace("id", "");
            if base.is_empty() {
                continue;
            }
            if let Some((candidate, _)) = tables
                .iter()
                .find(|(other, _)| other != table && other.to_lowercase().contains(&base))
            {
                links.push(format!(
                    "Inferred Link: {}.{} -> {} (likely JOIN key)",
                    table, col_name, candidate
                ));
            }
        }
    }
    links
}

/// Build the full description from a database file.
pub fn describe_database(db_path: &Path) -> Result<String> {
    let conn = open_read_only(db_path)?;
    let names = list_tables(&conn)?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = table_columns(&conn, &name)?;
        tables.push((name, columns));
    }
    drop(conn);

    let mut lines = Vec::new();
    for (table, columns) in &tables {
        lines.push(format!("Table: {}", table));
        lines.push(format!(
            "  Columns: {}",
            columns.iter().map(|c| format!("{} ({})", c.name, c.data_type)).join(", ")
        ));

        // A table that cannot be sampled still gets described.
        let sample_sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(table), SAMPLE_ROWS);
        if let Some(first) = run_query(db_path, &sample_sql).ok().and_then(|rows| rows.into_iter().next()) {
            lines.push(format!("  Samples: {}", serde_json::Value::Object(first)));
        }
        lines.push(String::new());
    }

    let relationships = infer_relationships(&tables);
    if !relationships.is_empty() {
        lines.push(RELATIONSHIPS_HEADER.to_string());
        lines.extend(relationships);
    }

    Ok(lines.join("\n"))
}

#[async_trait]
impl SchemaProvider for SqliteSchemaProvider {
    async fn describe_schema(&self) -> Result<String> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || describe_database(&db_path))
            .await
            .map_err(|e| CadetError::Database(format!("Schema task failed: {}", e)))?
    }
}
