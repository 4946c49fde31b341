#![allow(dead_code)]

use async_trait::async_trait;
use data_cadet::db::{QueryExecutor, Row, SchemaProvider};
use data_cadet::llm::TextGenerator;
use data_cadet::{CadetError, Result};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned responses in order and records every prompt it was given.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CadetError::Llm("script exhausted".to_string())))
    }
}

/// Replays canned executor outcomes; the last one repeats forever.
pub struct ScriptedExecutor {
    outcomes: Mutex<VecDeque<std::result::Result<Vec<Row>, String>>>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(outcomes: Vec<std::result::Result<Vec<Row>, String>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())])
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>> {
        self.executed.lock().unwrap().push(sql.to_string());
        let mut outcomes = self.outcomes.lock().unwrap();
        let outcome = if outcomes.len() > 1 {
            outcomes.pop_front()
        } else {
            outcomes.front().cloned()
        };
        match outcome {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(CadetError::Execution(message)),
            None => Ok(Vec::new()),
        }
    }
}

pub struct StaticSchema(pub &'static str);

#[async_trait]
impl SchemaProvider for StaticSchema {
    async fn describe_schema(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

pub const SALES_SCHEMA: &str = "Table: sales\n  Columns: region (TEXT), month (TEXT), revenue (REAL)";

pub fn row(pairs: &[(&str, Value)]) -> Row {
    let mut row = Row::new();
    for (key, value) in pairs {
        row.insert(key.to_string(), value.clone());
    }
    row
}

pub fn region_totals() -> Vec<Row> {
    [("West", 420.0), ("East", 310.5), ("North", 150.0), ("South", 99.0), ("Central", 75.25)]
        .iter()
        .map(|(region, total)| row(&[("region", json!(region)), ("total_sales", json!(total))]))
        .collect()
}

pub fn monthly_revenue() -> Vec<Row> {
    [("2024-01", 1000.0), ("2024-02", 1250.0), ("2024-03", 1400.0)]
        .iter()
        .map(|(month, revenue)| row(&[("month", json!(month)), ("revenue", json!(revenue))]))
        .collect()
}

pub fn fenced_sql(sql: &str) -> String {
    format!("Here is the query:\n```sql\n{}\n```", sql)
}
