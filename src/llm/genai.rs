//! Hosted and local model backends through the `genai` crate.

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage as GenAIChatMessage, ChatOptions, ChatRequest as GenAIChatRequest};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Environment variable pointing every request at a custom endpoint
pub const API_BASE_URL_ENV: &str = "FLOWSCOUT_API_BASE_URL";

pub struct GenAIClient {
    client: Client,
    provider: AdapterKind,
    model: String,
    timeout: Duration,
}

/// Routes all requests for `provider`/`model` to `endpoint_url`, keeping the
/// provider's usual API key variable for auth.
fn custom_endpoint_client(provider: AdapterKind, model: String, endpoint_url: String) -> Client {
    let resolver = ServiceTargetResolver::from_resolver_fn(
        move |_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let auth = provider
                .default_key_env_name()
                .map(AuthData::from_env)
                .unwrap_or_else(|| AuthData::from_single(""));

            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(endpoint_url.clone()),
                auth,
                model: ModelIden::new(provider, &model),
            })
        },
    );

    Client::builder()
        .with_service_target_resolver(resolver)
        .build()
}

fn to_genai(message: &ChatMessage) -> GenAIChatMessage {
    match message.role {
        MessageRole::System => GenAIChatMessage::system(&message.content),
        MessageRole::User => GenAIChatMessage::user(&message.content),
    }
}

impl GenAIClient {
    pub async fn new(
        provider: AdapterKind,
        model: String,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = match std::env::var(API_BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                debug!(provider = provider.as_str(), endpoint = %url, "Using custom endpoint");
                custom_endpoint_client(provider, model.clone(), url)
            }
            _ => Client::default(),
        };

        debug!(provider = provider.as_str(), model = %model, "GenAI client ready");

        Ok(Self {
            client,
            provider,
            model,
            timeout,
        })
    }

    pub fn provider(&self) -> AdapterKind {
        self.provider
    }
}

#[async_trait]
impl LLMClient for GenAIClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let start = Instant::now();

        let chat_request = GenAIChatRequest::new(request.messages.iter().map(to_genai).collect());
        let options = match request.temperature {
            Some(t) => ChatOptions::default().with_temperature(t as f64),
            None => ChatOptions::default(),
        };

        let call = self
            .client
            .exec_chat(&self.model, chat_request, Some(&options));

        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                warn!(
                    provider = self.provider.as_str(),
                    seconds = self.timeout.as_secs(),
                    "Model request timed out"
                );
                BackendError::TimeoutError {
                    seconds: self.timeout.as_secs(),
                }
            })?
            .map_err(|e| {
                warn!(provider = self.provider.as_str(), error = %e, "Model request failed");
                BackendError::ApiError {
                    message: format!("{} request failed: {}", self.provider.as_str(), e),
                }
            })?;

        let content = response.first_text().unwrap_or_default().to_string();
        Ok(LLMResponse::text(content, start.elapsed()))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl std::fmt::Debug for GenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAIClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_reports_provider_and_model() {
        let client = GenAIClient::new(
            AdapterKind::Ollama,
            "qwen2.5:7b".to_string(),
            Duration::from_secs(30),
        )
        .await
        .unwrap();

        assert_eq!(client.provider(), AdapterKind::Ollama);
        assert_eq!(client.name(), "Ollama");
        assert_eq!(client.model_info().as_deref(), Some("qwen2.5:7b"));
    }

    #[test]
    fn test_message_conversion_keeps_roles() {
        let system = to_genai(&ChatMessage::system("rules"));
        let user = to_genai(&ChatMessage::user("transcript"));
        assert!(format!("{:?}", system).contains("System"));
        assert!(format!("{:?}", user).contains("User"));
    }
}
