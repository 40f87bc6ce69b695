//! Record/replay wrapper around another [`LLMClient`].
//!
//! Exchanges are stored as one JSON file per request under the recordings
//! directory, named `<test name>__<md5 of the normalized request>.json`.
//! Replaying lets the extraction and classification prompts be exercised
//! against real model output without network access.

use super::client::LLMClient;
use super::error::BackendError;
use super::test_context::TestContext;
use super::types::{ChatMessage, LLMRequest, LLMResponse};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const RECORDING_MODE_ENV: &str = "FLOWSCOUT_RECORDING_MODE";
pub const RECORDINGS_DIR_ENV: &str = "FLOWSCOUT_RECORDINGS_DIR";

const DEFAULT_RECORDINGS_DIR: &str = "tests/recordings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingMode {
    /// Always call the inner client and overwrite the recording
    Record,
    /// Never call the inner client; a missing recording is an error
    Replay,
    /// Replay when recorded, otherwise call through and record
    Auto,
}

impl FromStr for RecordingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "record" => Ok(Self::Record),
            "replay" => Ok(Self::Replay),
            "auto" => Ok(Self::Auto),
            other => anyhow::bail!("Invalid recording mode '{}' (record, replay, auto)", other),
        }
    }
}

impl RecordingMode {
    pub fn from_env(default: RecordingMode) -> RecordingMode {
        match std::env::var(RECORDING_MODE_ENV) {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, using {:?}", e, default);
                default
            }),
            Err(_) => default,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedExchange {
    pub request_hash: String,
    pub request: RecordedRequest,
    pub response: LLMResponse,
    pub recorded_at: String,
}

/// The parts of a request that decide its reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub model: Option<String>,
}

impl RecordedRequest {
    pub fn from_llm_request(request: &LLMRequest, model: Option<String>) -> Self {
        Self {
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role,
                    content: normalize_text(&m.content),
                })
                .collect(),
            temperature: request.temperature,
            model,
        }
    }

    pub fn canonical_hash(&self) -> String {
        let canonical = serde_json::to_string(self).unwrap_or_default();
        format!("{:x}", md5::compute(canonical.as_bytes()))
    }
}

/// Transcripts pasted from different tools differ in line endings and
/// trailing blanks; neither changes what the model is asked.
fn normalize_text(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

pub struct RecordingLLMClient {
    inner: Arc<dyn LLMClient>,
    mode: RecordingMode,
    recordings_dir: PathBuf,
    cache: Mutex<HashMap<PathBuf, LLMResponse>>,
}

impl RecordingLLMClient {
    pub fn new(
        inner: Arc<dyn LLMClient>,
        mode: RecordingMode,
        recordings_dir: PathBuf,
    ) -> Result<Self> {
        fs::create_dir_all(&recordings_dir).with_context(|| {
            format!(
                "Failed to create recordings directory {}",
                recordings_dir.display()
            )
        })?;

        Ok(Self {
            inner,
            mode,
            recordings_dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Mode from `FLOWSCOUT_RECORDING_MODE` (default auto), directory from
    /// `FLOWSCOUT_RECORDINGS_DIR` (default `tests/recordings`)
    pub fn from_env(inner: Arc<dyn LLMClient>) -> Result<Self> {
        let dir = std::env::var(RECORDINGS_DIR_ENV)
            .unwrap_or_else(|_| DEFAULT_RECORDINGS_DIR.to_string());
        Self::new(inner, RecordingMode::from_env(RecordingMode::Auto), dir.into())
    }

    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    fn recording_path(&self, request_hash: &str) -> PathBuf {
        let file = match TestContext::current_test_name() {
            Some(test) => format!("{}__{}.json", test, request_hash),
            None => format!("{}.json", request_hash),
        };
        self.recordings_dir.join(file)
    }

    fn cached(&self, path: &Path) -> Option<LLMResponse> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(path).cloned())
    }

    fn remember(&self, path: PathBuf, response: &LLMResponse) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(path, response.clone());
        }
    }

    fn replay(&self, path: &Path) -> Result<Option<LLMResponse>> {
        if let Some(response) = self.cached(path) {
            return Ok(Some(response));
        }
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording {}", path.display()))?;
        let exchange: RecordedExchange = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse recording {}", path.display()))?;

        debug!(path = %path.display(), "Replaying recorded exchange");
        self.remember(path.to_path_buf(), &exchange.response);
        Ok(Some(exchange.response))
    }

    fn save(&self, path: &Path, request: &RecordedRequest, response: &LLMResponse) -> Result<()> {
        let exchange = RecordedExchange {
            request_hash: request.canonical_hash(),
            request: request.clone(),
            response: response.clone(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
        };

        let contents =
            serde_json::to_string_pretty(&exchange).context("Failed to serialize recording")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write recording {}", path.display()))?;

        debug!(path = %path.display(), "Recorded exchange");
        self.remember(path.to_path_buf(), response);
        Ok(())
    }

    /// Writes the unmatched request next to the recordings for inspection
    fn dump_missing(&self, request: &RecordedRequest) -> PathBuf {
        let test = TestContext::current_test_name().unwrap_or_else(|| "unknown_test".to_string());
        let path = self.recordings_dir.join(format!("MISSING_{}.json", test));

        let written = serde_json::to_string_pretty(request)
            .map_err(anyhow::Error::from)
            .and_then(|json| fs::write(&path, json).map_err(anyhow::Error::from));
        if let Err(e) = written {
            warn!(path = %path.display(), "Could not dump missing request: {}", e);
        }
        path
    }
}

fn backend_error(e: anyhow::Error) -> BackendError {
    BackendError::Other {
        message: format!("{:#}", e),
    }
}

#[async_trait::async_trait]
impl LLMClient for RecordingLLMClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let recorded = RecordedRequest::from_llm_request(&request, self.inner.model_info());
        let request_hash = recorded.canonical_hash();
        let path = self.recording_path(&request_hash);

        if self.mode != RecordingMode::Record {
            if let Some(response) = self.replay(&path).map_err(backend_error)? {
                return Ok(response);
            }
        }

        if self.mode == RecordingMode::Replay {
            let dumped = self.dump_missing(&recorded);
            return Err(BackendError::Other {
                message: format!(
                    "No recording for request {} in replay mode; request written to {}",
                    request_hash,
                    dumped.display()
                ),
            });
        }

        let response = self.inner.chat(request).await?;
        self.save(&path, &recorded, &response)
            .map_err(backend_error)?;
        Ok(response)
    }

    fn name(&self) -> &str {
        "RecordingLLMClient"
    }

    fn model_info(&self) -> Option<String> {
        self.inner.model_info()
    }
}
