use super::error::QueryError;
use crate::llm::LLMClient;
use crate::model::{FeatureCategory, Repository};
use crate::pipeline::llm_helper::{query_llm_json, LlmCallError};
use crate::pipeline::ExchangeLog;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PHASE: &str = "classify";

const SYSTEM_PROMPT: &str = "You are a product analyst classifying feature requests. \
Respond with JSON only.";

/// A proposed feature plus optional caller-supplied classification hints.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRequest {
    pub feature: String,
    pub user_type: Option<String>,
    pub feature_cat: Option<FeatureCategory>,
    pub temperature: f32,
}

impl FeatureRequest {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            user_type: None,
            feature_cat: None,
            temperature: 0.0,
        }
    }

    pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self
    }

    pub fn with_feature_cat(mut self, feature_cat: FeatureCategory) -> Self {
        self.feature_cat = Some(feature_cat);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn user_type_hint(&self) -> Option<&str> {
        self.user_type
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Role, change scale and implied action sequence of a feature request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub user_type: String,
    pub feature_cat: FeatureCategory,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default)]
    user_type: Option<String>,
    #[serde(default)]
    feature_cat: Option<String>,
    #[serde(default)]
    actions: Option<Vec<String>>,
}

fn known_roles(repository: &Repository) -> Vec<&str> {
    let mut roles: Vec<&str> = Vec::new();
    for role in repository.flows.iter().filter_map(|f| f.user_type.as_deref()) {
        if !roles.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            roles.push(role);
        }
    }
    roles
}

fn build_prompt(feature: &str, roles: &[&str]) -> String {
    let roles_hint = if roles.is_empty() {
        "(none recorded)".to_string()
    } else {
        roles.join(", ")
    };

    format!(
        r#"Classify this proposed feature.

Feature: "{}"

User roles already present in the product: {}

Respond with JSON:
{{
  "user_type": "the role that would use the feature, reusing an existing role when one fits",
  "feature_cat": "new-feature | ui-improvement | ux-improvement",
  "actions": ["ordered", "user actions", "the feature implies"]
}}"#,
        feature, roles_hint
    )
}

fn resolve(raw: RawClassification, request: &FeatureRequest) -> Result<Classification, QueryError> {
    let user_type = match request.user_type_hint() {
        Some(hint) => hint.to_string(),
        None => raw
            .user_type
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| QueryError::Classification("missing user_type".to_string()))?,
    };

    let feature_cat = match request.feature_cat {
        Some(cat) => cat,
        None => raw
            .feature_cat
            .ok_or_else(|| QueryError::Classification("missing feature_cat".to_string()))?
            .parse::<FeatureCategory>()
            .map_err(|e| QueryError::Classification(e.to_string()))?,
    };

    let actions = raw
        .actions
        .unwrap_or_default()
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();

    Ok(Classification {
        user_type,
        feature_cat,
        actions,
    })
}

/// Classifies a request with one model call. When the caller supplied both
/// hints no call is made; supplied hints always win over model output.
pub async fn classify(
    llm_client: &dyn LLMClient,
    request: &FeatureRequest,
    repository: &Repository,
    exchange_log: &ExchangeLog,
) -> Result<Classification, QueryError> {
    if let (Some(user_type), Some(feature_cat)) = (request.user_type_hint(), request.feature_cat) {
        debug!("Both hints supplied, skipping classification call");
        return Ok(Classification {
            user_type: user_type.to_string(),
            feature_cat,
            actions: Vec::new(),
        });
    }

    let prompt = build_prompt(&request.feature, &known_roles(repository));
    let value = query_llm_json(
        llm_client,
        SYSTEM_PROMPT,
        prompt,
        request.temperature,
        PHASE,
        exchange_log,
    )
    .await
    .map_err(|e| match e {
        LlmCallError::Backend(source) => QueryError::Backend(source),
        LlmCallError::InvalidJson { message, .. } => QueryError::Classification(message),
    })?;

    let raw: RawClassification = serde_json::from_value(value)
        .map_err(|e| QueryError::Classification(format!("unexpected shape: {}", e)))?;

    resolve(raw, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLLMClient, MockResponse};
    use crate::model::Flow;
    use serde_json::json;

    fn repository_with_roles(roles: &[&str]) -> Repository {
        let mut repo = Repository::new("mailer");
        for role in roles {
            repo.flows.push(Flow {
                flow: format!("{} flow", role),
                screens: Vec::new(),
                interactions: Vec::new(),
                confidence: 1.0,
                user_type: Some(role.to_string()),
                feature_cat: None,
            });
        }
        repo
    }

    #[tokio::test]
    async fn test_both_hints_skip_model() {
        let client = MockLLMClient::new();
        let request = FeatureRequest::new("dark mode")
            .with_user_type("reader")
            .with_feature_cat(FeatureCategory::UiImprovement);

        let result = classify(&client, &request, &Repository::new("x"), &ExchangeLog::disabled())
            .await
            .unwrap();

        assert_eq!(result.user_type, "reader");
        assert_eq!(result.feature_cat, FeatureCategory::UiImprovement);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_model_classification() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::json(json!({
            "user_type": "sender",
            "feature_cat": "new feature",
            "actions": ["compose", " attach file ", ""]
        })));

        let result = classify(
            &client,
            &FeatureRequest::new("attach a file"),
            &repository_with_roles(&["sender", "Sender", "admin"]),
            &ExchangeLog::disabled(),
        )
        .await
        .unwrap();

        assert_eq!(result.user_type, "sender");
        assert_eq!(result.feature_cat, FeatureCategory::NewFeature);
        assert_eq!(result.actions, vec!["compose", "attach file"]);

        let prompt = &client.requests()[0].messages[1].content;
        assert!(prompt.contains("sender, admin"));
    }

    #[tokio::test]
    async fn test_hint_overrides_model() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::json(json!({
            "user_type": "admin",
            "feature_cat": "ux-improvement"
        })));

        let request = FeatureRequest::new("bulk delete").with_user_type("guest");
        let result = classify(&client, &request, &Repository::new("x"), &ExchangeLog::disabled())
            .await
            .unwrap();

        assert_eq!(result.user_type, "guest");
        assert_eq!(result.feature_cat, FeatureCategory::UxImprovement);
        assert!(result.actions.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_response() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::text("It is probably a new feature."));

        let err = classify(
            &client,
            &FeatureRequest::new("x"),
            &Repository::new("x"),
            &ExchangeLog::disabled(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, QueryError::Classification(_)));
    }

    #[tokio::test]
    async fn test_invalid_category() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::json(json!({
            "user_type": "admin",
            "feature_cat": "rewrite"
        })));

        let err = classify(
            &client,
            &FeatureRequest::new("x"),
            &Repository::new("x"),
            &ExchangeLog::disabled(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, QueryError::Classification(_)));
    }

    #[tokio::test]
    async fn test_missing_user_type() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::json(json!({"feature_cat": "ui"})));

        let err = classify(
            &client,
            &FeatureRequest::new("x"),
            &Repository::new("x"),
            &ExchangeLog::disabled(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, QueryError::Classification(_)));
    }
}
