pub mod chart;
pub mod config;
pub mod db;
pub mod error;
pub mod execution_loop;
pub mod extract;
pub mod guardrails;
pub mod llm;
pub mod prompting;
pub mod validation;

pub use error::{CadetError, Result};
pub use execution_loop::{PipelineAnswer, PipelineController, SessionState};
