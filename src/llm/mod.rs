//! LLM client abstraction layer
//!
//! Every model call goes through the [`LLMClient`] trait so the builder and
//! the query engine can run against GenAI providers, canned mock responses or
//! on-disk recordings interchangeably.

mod client;
mod error;
mod genai;
mod mock;
mod recording;
mod selector;
mod test_context;
mod types;

pub use client::LLMClient;
pub use error::BackendError;
pub use genai::{GenAIClient, API_BASE_URL_ENV};
pub use mock::{MockLLMClient, MockResponse};
pub use recording::{
    RecordedExchange, RecordedRequest, RecordingLLMClient, RecordingMode, RECORDINGS_DIR_ENV,
    RECORDING_MODE_ENV,
};
pub use selector::{select_llm_client, SelectedClient};
pub use test_context::{TestContext, TEST_NAME_ENV};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
