//! Session State
//!
//! One record per question, threaded through every stage and discarded once
//! the answer is delivered.

use crate::db::Row;
use crate::execution_loop::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub question: String,
    pub sql_query: String,
    pub sql_error: Option<String>,
    pub query_result: Option<Vec<Row>>,
    pub retry_count: u8,
    pub final_answer: Option<String>,
    pub visualization_spec: Option<serde_json::Value>,
    /// Stages entered, in order.
    pub history: Vec<Stage>,
}

impl SessionState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            question: question.into(),
            sql_query: String::new(),
            sql_error: None,
            query_result: None,
            retry_count: 0,
            final_answer: None,
            visualization_spec: None,
            history: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.final_answer.is_some()
    }

    pub fn into_answer(self) -> PipelineAnswer {
        PipelineAnswer {
            final_answer: self
                .final_answer
                .unwrap_or_else(|| "No response generated.".to_string()),
            sql_query: self.sql_query,
            visualization_spec: self.visualization_spec,
        }
    }
}

/// The only part of a session that crosses the caller boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineAnswer {
    pub final_answer: String,
    pub sql_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_spec: Option<serde_json::Value>,
}
