//! Prompt templates for generation and summarization.

use crate::db::Row;

/// Rows shown to the generator when summarizing.
pub const PREVIEW_ROWS: usize = 10;

const SYSTEM_PROMPT: &str = r#"You are an elite SQL data analyst. Answer questions by writing accurate SQLite queries.

Capabilities:
1. READ-ONLY access. Never modify data.
2. Return ONLY the SQL query inside a markdown block: ```sql ... ```.

Database Schema:
{schema}

Rules:
1. Use LIKE for string matching (e.g. UPPER(col) LIKE '%VALUE%').
2. Always alias tables in joins.
3. If the answer needs data from several tables, use the Inferred Relationships to JOIN them."#;

const SCHEMA_UNAVAILABLE: &str = "(schema unavailable)";

pub fn system_prompt(schema: &str) -> String {
    let schema = if schema.trim().is_empty() { SCHEMA_UNAVAILABLE } else { schema };
    SYSTEM_PROMPT.replace("{schema}", schema)
}

pub fn generation_prompt(system_context: &str, question: &str) -> String {
    format!("{}\n\nQuestion: {}", system_context, question)
}

/// Ask for prose plus an optional chart directive in a `json` block.
pub fn summary_prompt(question: &str, sql: &str, rows: &[Row]) -> String {
    let preview: Vec<serde_json::Value> = rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|r| serde_json::Value::Object(r.clone()))
        .collect();
    let preview = serde_json::Value::Array(preview).to_string();
    let truncated = if rows.len() > PREVIEW_ROWS {
        format!(" ... ({} of {} rows shown)", PREVIEW_ROWS, rows.len())
    } else {
        String::new()
    };

    format!(
        r#"User Question: {question}
SQL Query Used: {sql}
Data Retrieved: {preview}{truncated}

Provide a concise summary of the data.
If the user asked for a chart, graph, plot or visualization, append after the summary a JSON block:
```json
{{"plot_type": "bar" | "pie" | "line" | "scatter", "x_axis": "column", "y_axis": "column", "title": "Chart Title"}}
```
Only use column names that appear in the data."#
    )
}
