//! Startup configuration
//!
//! Read once from the process environment (after `.env` is loaded by the
//! binary) and validated before any client is constructed.

use crate::error::{CadetError, Result};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_DB_PATH: &str = "local_data.db";
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Settings for the text generation service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl LlmConfig {
    /// Build a config, rejecting a blank API key or an out-of-range temperature.
    pub fn new(api_key: String, base_url: String, model: String, temperature: f32) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(CadetError::Config(
                "API key is empty. Set GROQ_API_KEY (or OPENAI_API_KEY) in the environment or .env file.".to_string(),
            ));
        }
        if model.trim().is_empty() {
            return Err(CadetError::Config("LLM model name is empty".to_string()));
        }
        if !(0.0..=2.0).contains(&temperature) {
            return Err(CadetError::Config(format!(
                "LLM temperature must be between 0 and 2, got {}",
                temperature
            )));
        }

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CadetConfig {
    pub llm: LlmConfig,
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl CadetConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Database settings only. Used by commands that never call the LLM.
    pub fn storage_from_env() -> (PathBuf, PathBuf) {
        storage_paths(&|key: &str| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup("OPENAI_API_KEY"))
            .ok_or_else(|| {
                CadetError::Config(
                    "GROQ_API_KEY not found. Set it (or OPENAI_API_KEY) in the environment or .env file.".to_string(),
                )
            })?;

        let base_url = lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let temperature = match lookup("LLM_TEMPERATURE") {
            Some(raw) => raw.trim().parse::<f32>().map_err(|e| {
                CadetError::Config(format!("LLM_TEMPERATURE '{}' is not a number: {}", raw, e))
            })?,
            None => 0.0,
        };

        let llm = LlmConfig::new(api_key, base_url, model, temperature)?;
        let (db_path, data_dir) = storage_paths(&lookup);

        Ok(Self { llm, db_path, data_dir })
    }
}

fn storage_paths<F>(lookup: &F) -> (PathBuf, PathBuf)
where
    F: Fn(&str) -> Option<String>,
{
    let db_path = lookup("CADET_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
    let data_dir = lookup("CADET_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    (PathBuf::from(db_path), PathBuf::from(data_dir))
}
