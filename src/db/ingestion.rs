//! CSV Ingestion - loads every `*.csv` in a directory into its own table

use crate::db::{list_tables, open_read_write, quote_ident};
use crate::error::{CadetError, Result};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedTable {
    pub name: String,
    pub rows: usize,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// `Order Date` -> `order_date`, `Total ($)` -> `total_dollars`
pub fn sanitize_column_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('-', "_")
        .replace(['(', ')'], "")
        .replace('$', "dollars")
}

/// `Sales Customers.csv` -> `sales_customers`
pub fn table_name_for(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.trim().to_lowercase().replace(' ', "_"))
        .filter(|s| !s.is_empty())
}

fn unique_columns(headers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let mut name = sanitize_column_name(raw);
            if name.is_empty() {
                name = format!("column_{}", idx + 1);
            }
            let base = name.clone();
            let mut suffix = 2;
            while !seen.insert(name.clone()) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

fn infer_type(values: impl Iterator<Item = String>) -> ColumnType {
    let mut inferred = ColumnType::Integer;
    for value in values {
        let cell = value.trim();
        if cell.is_empty() {
            continue;
        }
        if inferred == ColumnType::Integer && cell.parse::<i64>().is_ok() {
            continue;
        }
        if cell.parse::<f64>().is_ok() {
            inferred = ColumnType::Real;
            continue;
        }
        return ColumnType::Text;
    }
    inferred
}

fn to_sql_value(cell: &str, column_type: ColumnType) -> SqlValue {
    let cell = cell.trim();
    if cell.is_empty() {
        return SqlValue::Null;
    }
    match column_type {
        ColumnType::Integer => cell.parse().map(SqlValue::Integer).unwrap_or_else(|_| SqlValue::Text(cell.to_string())),
        ColumnType::Real => cell.parse().map(SqlValue::Real).unwrap_or_else(|_| SqlValue::Text(cell.to_string())),
        ColumnType::Text => SqlValue::Text(cell.to_string()),
    }
}

/// Replace `table` with the contents of the CSV at `path`. Returns the row count.
fn load_csv(conn: &mut Connection, table: &str, path: &Path) -> Result<usize> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(CadetError::Ingestion(format!("{} has no header row", path.display())));
    }
    let columns = unique_columns(&headers);

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        cells.resize(columns.len(), String::new());
        records.push(cells);
    }

    let types: Vec<ColumnType> = (0..columns.len())
        .map(|idx| infer_type(records.iter().map(|r| r[idx].clone())))
        .collect();

    let column_defs = columns
        .iter()
        .zip(&types)
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.sql()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");

    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])?;
    tx.execute(&format!("CREATE TABLE {} ({})", quote_ident(table), column_defs), [])?;
    {
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(table),
            placeholders
        ))?;
        for record in &records {
            let values = record.iter().zip(&types).map(|(cell, ty)| to_sql_value(cell, *ty));
            insert.execute(params_from_iter(values))?;
        }
    }
    tx.commit()?;

    Ok(records.len())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    for table in list_tables(conn)? {
        conn.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(&table)), [])?;
    }
    Ok(())
}

/// Load every `.csv` file in `dir` into the database at `db_path`.
///
/// With `reset`, every existing table is dropped first. A file that fails to
/// load is logged and skipped.
pub fn ingest_csv_directory(db_path: &Path, dir: &Path, reset: bool) -> Result<Vec<IngestedTable>> {
    if !dir.is_dir() {
        return Err(CadetError::Ingestion(format!("Directory {} not found.", dir.display())));
    }

    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    info!("Found {} CSV file(s) in {}", files.len(), dir.display());

    let mut conn = open_read_write(db_path)?;
    if reset {
        drop_all_tables(&conn)?;
    }

    let mut loaded = Vec::new();
    for path in files {
        let Some(table) = table_name_for(&path) else {
            warn!("Skipping {}: cannot derive a table name", path.display());
            continue;
        };
        match load_csv(&mut conn, &table, &path) {
            Ok(rows) => {
                info!("Loaded table '{}' ({} rows)", table, rows);
                loaded.push(IngestedTable { name: table, rows, loaded_at: Utc::now() });
            }
            Err(e) => warn!("Failed to load {}: {}", path.display(), e),
        }
    }

    Ok(loaded)
}
