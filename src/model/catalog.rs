//! Product-level catalog: where a repository came from, what the app is and
//! which features the transcript demonstrates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provenance of a built repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub app_name: String,
    /// Free-form key/value pairs supplied by whoever ran the build
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SourceInfo {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            metadata: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A user-facing capability of the product, tied to the flows and screens
/// that deliver it. `flows` holds flow paths and `screens` holds screen names,
/// both as they appear in the repository collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub flows: Vec<String>,
    #[serde(default)]
    pub screens: Vec<String>,
    #[serde(default)]
    pub entry_points: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub failure_criteria: Vec<String>,
}

impl Feature {
    /// Name, description, entry points and criteria as one searchable text
    pub fn search_text(&self) -> String {
        let mut parts = vec![self.name.as_str(), self.description.as_str()];
        parts.extend(self.entry_points.iter().map(String::as_str));
        parts.extend(self.success_criteria.iter().map(String::as_str));
        parts.extend(self.failure_criteria.iter().map(String::as_str));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_lists_default_to_empty() {
        let feature: Feature =
            serde_json::from_str(r#"{"name": "Scheduled send"}"#).unwrap();
        assert!(feature.flows.is_empty());
        assert!(feature.failure_criteria.is_empty());
        assert_eq!(feature.description, "");
    }

    #[test]
    fn test_search_text_includes_criteria() {
        let feature = Feature {
            name: "Scheduled send".to_string(),
            description: "Send later".to_string(),
            flows: Vec::new(),
            screens: Vec::new(),
            entry_points: vec!["Compose menu".to_string()],
            success_criteria: vec!["Message queued".to_string()],
            failure_criteria: vec!["Time in the past".to_string()],
        };
        let text = feature.search_text();
        assert!(text.contains("Compose menu"));
        assert!(text.contains("Message queued"));
        assert!(text.contains("Time in the past"));
    }

    #[test]
    fn test_source_metadata_round_trip() {
        let mut source = SourceInfo::new("mailer");
        source
            .metadata
            .insert("recorded".to_string(), Value::String("2024-05".to_string()));

        let json = serde_json::to_string(&source).unwrap();
        let loaded: SourceInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, source);
    }
}
