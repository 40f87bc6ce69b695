//! Backend selection for the CLI.
//!
//! Order: the configured hosted provider when its API key variable is set,
//! then a local Ollama if one answers. Ollama as the configured provider
//! goes straight to the reachability check.

use crate::config::FlowscoutConfig;
use crate::llm::{GenAIClient, LLMClient};
use anyhow::{bail, Result};
use genai::adapter::AdapterKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const FALLBACK_OLLAMA_MODEL: &str = "qwen2.5:7b";
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(2);

pub struct SelectedClient {
    pub client: Arc<dyn LLMClient>,
    pub provider: AdapterKind,
    pub description: String,
}

impl std::fmt::Debug for SelectedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedClient")
            .field("provider", &self.provider)
            .field("description", &self.description)
            .finish()
    }
}

/// A backend worth trying, with the model it would run
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    provider: AdapterKind,
    model: String,
}

impl Candidate {
    fn is_local(&self) -> bool {
        self.provider == AdapterKind::Ollama
    }
}

fn has_credentials(provider: AdapterKind) -> bool {
    provider
        .default_key_env_name()
        .map_or(true, |var| std::env::var(var).is_ok())
}

/// Candidates in preference order. Hosted model names mean nothing to
/// Ollama, so the local fallback runs its own default model.
fn candidates(config: &FlowscoutConfig) -> Vec<Candidate> {
    if config.provider == AdapterKind::Ollama {
        return vec![Candidate {
            provider: AdapterKind::Ollama,
            model: config.model.clone(),
        }];
    }

    let mut list = Vec::with_capacity(2);
    if has_credentials(config.provider) {
        list.push(Candidate {
            provider: config.provider,
            model: config.model.clone(),
        });
    } else {
        debug!(provider = %config.provider, "No credentials, skipping configured provider");
    }
    list.push(Candidate {
        provider: AdapterKind::Ollama,
        model: FALLBACK_OLLAMA_MODEL.to_string(),
    });
    list
}

fn ollama_host() -> String {
    std::env::var("OLLAMA_HOST")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string())
}

async fn ollama_reachable() -> bool {
    let url = format!("{}/api/tags", ollama_host().trim_end_matches('/'));

    let result = reqwest::Client::new()
        .get(&url)
        .timeout(REACHABILITY_TIMEOUT)
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => true,
        Ok(resp) => {
            debug!(url = %url, status = %resp.status(), "Ollama reachability check failed");
            false
        }
        Err(e) => {
            debug!(url = %url, error = %e, "Ollama not reachable");
            false
        }
    }
}

/// Picks the first usable backend for `config`
pub async fn select_llm_client(config: &FlowscoutConfig) -> Result<SelectedClient> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    for candidate in candidates(config) {
        if candidate.is_local() && !ollama_reachable().await {
            continue;
        }

        match GenAIClient::new(candidate.provider, candidate.model.clone(), timeout).await {
            Ok(client) => {
                let description = format!("{} ({})", candidate.provider, candidate.model);
                info!(backend = %description, "Selected LLM backend");
                return Ok(SelectedClient {
                    client: Arc::new(client),
                    provider: candidate.provider,
                    description,
                });
            }
            Err(e) => warn!(provider = %candidate.provider, "Backend unavailable: {}", e),
        }
    }

    bail!(
        "No LLM backend available. Set FLOWSCOUT_PROVIDER and its API key \
         (e.g. ANTHROPIC_API_KEY, OPENAI_API_KEY), or start a local Ollama"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config(provider: AdapterKind, model: &str) -> FlowscoutConfig {
        FlowscoutConfig {
            provider,
            model: model.to_string(),
            ..FlowscoutConfig::default()
        }
    }

    #[test]
    #[serial]
    fn test_ollama_configured_is_only_candidate() {
        let list = candidates(&config(AdapterKind::Ollama, "llama3.1:8b"));
        assert_eq!(
            list,
            vec![Candidate {
                provider: AdapterKind::Ollama,
                model: "llama3.1:8b".to_string(),
            }]
        );
    }

    #[test]
    #[serial]
    fn test_hosted_provider_with_key_then_local_fallback() {
        std::env::set_var("OPENAI_API_KEY", "test-key");
        let list = candidates(&config(AdapterKind::OpenAI, "gpt-4o-mini"));
        std::env::remove_var("OPENAI_API_KEY");

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].provider, AdapterKind::OpenAI);
        assert_eq!(list[1].model, FALLBACK_OLLAMA_MODEL);
    }

    #[test]
    #[serial]
    fn test_hosted_provider_without_key_falls_back() {
        std::env::remove_var("ANTHROPIC_API_KEY");
        let list = candidates(&config(AdapterKind::Anthropic, "claude-3-5-haiku-latest"));

        assert_eq!(list.len(), 1);
        assert!(list[0].is_local());
    }

    #[test]
    #[serial]
    fn test_ollama_host_override() {
        std::env::set_var("OLLAMA_HOST", "http://gpu-box:11434/");
        let host = ollama_host();
        std::env::remove_var("OLLAMA_HOST");

        assert_eq!(host, "http://gpu-box:11434/");
        assert_eq!(ollama_host(), DEFAULT_OLLAMA_HOST);
    }
}
