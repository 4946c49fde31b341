use thiserror::Error;

#[derive(Error, Debug)]
pub enum CadetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Validation error: {0}")]
    Validation(#[from] crate::validation::SafetyViolation),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<rusqlite::Error> for CadetError {
    fn from(err: rusqlite::Error) -> Self {
        CadetError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CadetError>;
