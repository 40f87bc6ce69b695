use super::exchange_log::ExchangeLog;
use crate::llm::{BackendError, LLMClient, LLMRequest};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LlmCallError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{message}")]
    InvalidJson { message: String, content: String },
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"```(?:json|JSON)?\s*\n?([\s\S]*?)\n?```").expect("Invalid fence regex")
    })
}

/// Longest JSON array or object that parses starting at some `[` or `{`.
/// Starts inside an already parsed value are skipped since they can only be
/// shorter.
fn largest_json_value(text: &str) -> Option<&str> {
    let mut best: Option<&str> = None;
    let mut covered_until = 0;

    for (start, _) in text.match_indices(['[', '{']) {
        if start < covered_until {
            continue;
        }
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(_)) = stream.next() {
            let end = start + stream.byte_offset();
            covered_until = end;
            if best.map_or(true, |b| end - start > b.len()) {
                best = Some(&text[start..end]);
            }
        }
    }

    best
}

/// Pulls the JSON payload out of a model reply: a fenced block if present,
/// otherwise the longest parseable array or object in the surrounding prose.
/// When nothing parses, the span from the first opening bracket to its last
/// closing one is returned so the caller can report the parse error.
pub fn extract_json(content: &str) -> Option<&str> {
    let trimmed = content.trim();

    if let Some(inner) = fence_regex()
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
    {
        if !inner.is_empty() {
            return Some(inner);
        }
    }

    if let Some(value) = largest_json_value(trimmed) {
        return Some(value);
    }

    let start = trimmed.find(['[', '{'])?;
    let closing = if trimmed[start..].starts_with('[') {
        ']'
    } else {
        '}'
    };
    let end = trimmed.rfind(closing)?;

    (start < end).then(|| &trimmed[start..=end])
}

fn preview(content: &str) -> String {
    content.chars().take(200).collect()
}

/// Sends one system+user exchange and parses the reply as JSON.
pub async fn query_llm_json(
    llm_client: &dyn LLMClient,
    system_prompt: &str,
    user_prompt: String,
    temperature: f32,
    phase: &str,
    exchange_log: &ExchangeLog,
) -> Result<Value, LlmCallError> {
    let start = Instant::now();

    let request = LLMRequest::prompt(system_prompt, user_prompt).with_temperature(temperature);
    debug!(phase, prompt_chars = request.prompt_chars(), "Sending model request");

    let response = llm_client.chat(request.clone()).await?;
    let latency_ms = start.elapsed().as_millis() as u64;

    exchange_log.log_exchange(phase, &request, &response, latency_ms);
    debug!(
        phase,
        response_chars = response.content.len(),
        latency_ms,
        "Model response received"
    );

    let json = extract_json(&response.content).ok_or_else(|| LlmCallError::InvalidJson {
        message: format!("No JSON found in {} response", phase),
        content: preview(&response.content),
    })?;

    serde_json::from_str(json).map_err(|e| LlmCallError::InvalidJson {
        message: format!("Failed to parse {} response: {}", phase, e),
        content: preview(json),
    })
}
