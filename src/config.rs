//! Configuration management for flowscout
//!
//! Settings come from environment variables with fallbacks; CLI flags
//! override them afterwards.
//!
//! # Environment Variables
//!
//! - `FLOWSCOUT_PROVIDER`: ollama|openai|anthropic|gemini|xai|groq - default: "ollama"
//! - `FLOWSCOUT_MODEL`: Model name - default depends on the provider
//! - `FLOWSCOUT_REQUEST_TIMEOUT`: Timeout in seconds - default: "60"
//! - `FLOWSCOUT_LOG_LEVEL`: Logging level - default: "info"
//! - `FLOWSCOUT_TOP_K`: Number of flows returned per query - default: "5"
//! - `FLOWSCOUT_MIN_SCORE`: Flows scoring below this are dropped - default: "0.0"
//! - `FLOWSCOUT_WEIGHT_ROLE`, `FLOWSCOUT_WEIGHT_SCALE`, `FLOWSCOUT_WEIGHT_FLOW`:
//!   scoring weights - default: "0.4", "0.2", "0.4"
//! - `FLOWSCOUT_EXCHANGE_LOG`: JSONL file receiving every model exchange - default: unset
//!
//! Recording (`FLOWSCOUT_RECORDING_MODE`, `FLOWSCOUT_RECORDINGS_DIR`) and the
//! custom endpoint (`FLOWSCOUT_API_BASE_URL`) are read by the LLM clients
//! themselves. Provider credentials use the variables genai expects
//! (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `OLLAMA_HOST`, ...).

use crate::query::{sanitize_top_k, ScoringWeights};
use genai::adapter::AdapterKind;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TOP_K: usize = 5;
const DEFAULT_MIN_SCORE: f64 = 0.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: ollama, openai, anthropic, gemini, xai, groq")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone)]
pub struct FlowscoutConfig {
    /// LLM provider (from genai)
    pub provider: AdapterKind,

    /// Model name, provider-specific
    pub model: String,

    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Flows returned per query, kept within 1..=10
    pub top_k: usize,

    pub min_score: f64,

    pub weights: ScoringWeights,

    /// Optional JSONL exchange log
    pub exchange_log: Option<PathBuf>,
}

pub fn parse_provider(s: &str) -> Result<AdapterKind, ConfigError> {
    match s.trim().to_lowercase().as_str() {
        "ollama" => Ok(AdapterKind::Ollama),
        "openai" => Ok(AdapterKind::OpenAI),
        "anthropic" | "claude" => Ok(AdapterKind::Anthropic),
        "gemini" => Ok(AdapterKind::Gemini),
        "xai" | "grok" => Ok(AdapterKind::Xai),
        "groq" => Ok(AdapterKind::Groq),
        _ => Err(ConfigError::InvalidProvider(s.to_string())),
    }
}

pub fn default_model_for(provider: AdapterKind) -> &'static str {
    match provider {
        AdapterKind::OpenAI => "gpt-4o-mini",
        AdapterKind::Anthropic => "claude-3-5-haiku-latest",
        AdapterKind::Gemini => "gemini-1.5-flash",
        AdapterKind::Xai => "grok-beta",
        AdapterKind::Groq => "llama-3.1-8b-instant",
        _ => "qwen2.5:7b",
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::ParseError {
                    field: key.to_string(),
                    error: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}

impl FlowscoutConfig {
    /// Reads `FLOWSCOUT_*` variables, failing on values that don't parse
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = match env::var("FLOWSCOUT_PROVIDER") {
            Ok(raw) if !raw.trim().is_empty() => parse_provider(&raw)?,
            _ => AdapterKind::Ollama,
        };

        let model = env::var("FLOWSCOUT_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model_for(provider).to_string());

        let defaults = ScoringWeights::default();
        let weights = ScoringWeights {
            role: env_parse("FLOWSCOUT_WEIGHT_ROLE")?.unwrap_or(defaults.role),
            scale: env_parse("FLOWSCOUT_WEIGHT_SCALE")?.unwrap_or(defaults.scale),
            flow_similarity: env_parse("FLOWSCOUT_WEIGHT_FLOW")?
                .unwrap_or(defaults.flow_similarity),
        };

        Ok(Self {
            provider,
            model,
            request_timeout_secs: env_parse("FLOWSCOUT_REQUEST_TIMEOUT")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_level: env::var("FLOWSCOUT_LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            top_k: env_parse("FLOWSCOUT_TOP_K")?.unwrap_or(DEFAULT_TOP_K),
            min_score: env_parse("FLOWSCOUT_MIN_SCORE")?.unwrap_or(DEFAULT_MIN_SCORE),
            weights,
            exchange_log: env::var("FLOWSCOUT_EXCHANGE_LOG")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    fn builtin() -> Self {
        Self {
            provider: AdapterKind::Ollama,
            model: default_model_for(AdapterKind::Ollama).to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            weights: ScoringWeights::default(),
            exchange_log: None,
        }
    }

    /// Checks value ranges and the scoring weights
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(ConfigError::ValidationFailed(format!(
                "Minimum score must be within [0, 1], got {}",
                self.min_score
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        self.weights.validate()
    }

    /// `top_k` clamped to the supported range
    pub fn effective_top_k(&self) -> usize {
        sanitize_top_k(Some(self.top_k))
    }
}

impl Default for FlowscoutConfig {
    /// Loads from the environment, falling back to built-in defaults when a
    /// variable fails to parse
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            warn!("Ignoring environment configuration: {}", e);
            Self::builtin()
        })
    }
}

impl fmt::Display for FlowscoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Flowscout Configuration:")?;
        writeln!(f, "  Provider: {:?}", self.provider)?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Top K: {}", self.top_k)?;
        writeln!(f, "  Min Score: {}", self.min_score)?;
        writeln!(
            f,
            "  Weights: role={} scale={} flow={}",
            self.weights.role, self.weights.scale, self.weights.flow_similarity
        )?;
        if let Some(ref path) = self.exchange_log {
            writeln!(f, "  Exchange Log: {}", path.display())?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
