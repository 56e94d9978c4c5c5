use anyhow::{Context, Result};

use crate::embedding_client::DEFAULT_MODEL;
use crate::skills::matcher::DEFAULT_FUZZY_THRESHOLD;

const DEFAULT_MAX_INPUT_CHARS: usize = 15_000;
const MIN_FUZZY_THRESHOLD: f64 = 0.5;
const MAX_FUZZY_THRESHOLD: f64 = 1.0;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub taxonomy_path: String,
    /// Base URL of an OpenAI-compatible embeddings API. Unset → lexical semantic scoring.
    pub embedding_api_url: Option<String>,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub max_input_chars: usize,
    pub fuzzy_threshold: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            taxonomy_path: require_env("TAXONOMY_PATH")?,
            embedding_api_url: optional_env("EMBEDDING_API_URL"),
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_input_chars: match optional_env("MAX_INPUT_CHARS") {
                Some(raw) => raw
                    .parse::<usize>()
                    .context("MAX_INPUT_CHARS must be a positive integer")?,
                None => DEFAULT_MAX_INPUT_CHARS,
            },
            fuzzy_threshold: match optional_env("FUZZY_THRESHOLD") {
                Some(raw) => clamp_threshold(
                    raw.parse::<f64>()
                        .context("FUZZY_THRESHOLD must be a number")?,
                ),
                None => DEFAULT_FUZZY_THRESHOLD,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Set and non-blank, trimmed.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clamp_threshold(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_FUZZY_THRESHOLD
    } else {
        value.clamp(MIN_FUZZY_THRESHOLD, MAX_FUZZY_THRESHOLD)
    }
}
