use super::client::LLMClient;
use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One canned reply
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Fail(BackendError),
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        MockResponse::Text(content.into())
    }

    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Text(value.to_string())
    }

    pub fn error(error: BackendError) -> Self {
        MockResponse::Fail(error)
    }
}

#[derive(Default)]
struct MockState {
    queue: VecDeque<MockResponse>,
    seen: Vec<LLMRequest>,
}

/// Replays queued responses in order and remembers every request, so tests
/// can drive the builder phase by phase and inspect the prompts sent.
pub struct MockLLMClient {
    state: Mutex<MockState>,
    name: String,
}

impl MockLLMClient {
    pub fn new() -> Self {
        Self::with_name("MockLLM")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            name: name.into(),
        }
    }

    // poisoned only after a test already panicked
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_response(&self, response: MockResponse) {
        self.state().queue.push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        self.state().queue.extend(responses);
    }

    pub fn remaining_responses(&self) -> usize {
        self.state().queue.len()
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.state().seen.clone()
    }

    /// User prompt of the most recent request
    pub fn last_user_prompt(&self) -> Option<String> {
        self.state()
            .seen
            .last()
            .and_then(|r| r.user_prompt().map(str::to_string))
    }
}

impl Default for MockLLMClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let mut state = self.state();
        let call = state.seen.len() + 1;
        state.seen.push(request);

        let next = state.queue.pop_front().ok_or_else(|| BackendError::Other {
            message: format!("{}: no response queued for call #{}", self.name, call),
        })?;

        match next {
            MockResponse::Text(content) => Ok(LLMResponse::text(content, Duration::ZERO)),
            MockResponse::Fail(error) => Err(error),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model_info(&self) -> Option<String> {
        Some("mock-model".to_string())
    }
}

impl std::fmt::Debug for MockLLMClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLLMClient")
            .field("name", &self.name)
            .field("remaining_responses", &self.remaining_responses())
            .finish()
    }
}
