use super::common::{parse_collection, required_name};
use crate::model::{name_key, path_key, AppInfo, Feature, Flow, Screen};
use crate::pipeline::llm_helper::query_llm_json;
use crate::pipeline::{BuildContext, ExtractionError, ExtractionPhase};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

const PHASE: &str = "features";

const SYSTEM_PROMPT: &str = "You are a product analyst cataloguing the features of a product \
from a demo transcript, its screens and its flows. Use only what the transcript shows or says. \
Respond with JSON only.";

#[derive(Debug, Deserialize)]
struct RawApp {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    flows: Option<Vec<String>>,
    #[serde(default)]
    screens: Option<Vec<String>>,
    #[serde(default)]
    entry_points: Option<Vec<String>>,
    #[serde(default)]
    success_criteria: Option<Vec<String>>,
    #[serde(default)]
    failure_criteria: Option<Vec<String>>,
}

fn build_prompt(app_name: &str, transcript: &str, screens: &[Screen], flows: &[Flow]) -> String {
    let screen_list: Vec<String> = screens.iter().map(|s| format!("- {}", s.name)).collect();
    let flow_list: Vec<String> = flows.iter().map(|f| format!("- {}", f.flow)).collect();

    format!(
        r#"Catalogue the app "{}" and the features demonstrated in this transcript.

Transcript:
"""
{}
"""

Known screens:
{}

Known flows:
{}

Respond with a JSON object:
{{
  "app": {{"name": "Mailer", "description": "what the app is for"}},
  "features": [
    {{
      "name": "Send a message",
      "description": "what the feature lets the user do",
      "flows": ["login -> home -> compose -> send"],
      "screens": ["Compose"],
      "entry_points": ["Compose button on the inbox"],
      "success_criteria": ["The message appears in Sent"],
      "failure_criteria": ["Sending without a recipient shows an error"]
    }}
  ]
}}

Rules:
- "flows" copies paths exactly from the known flows
- "screens" uses ONLY names from the known screens
- Leave a list empty when the transcript says nothing about it"#,
        app_name,
        transcript,
        screen_list.join("\n"),
        flow_list.join("\n")
    )
}

fn clean_list(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Maps each reference to the collection's own spelling, dropping repeats
fn resolve_refs(
    feature: &str,
    refs: Vec<String>,
    kind: &'static str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<String>, ExtractionError> {
    let mut resolved: Vec<String> = Vec::with_capacity(refs.len());
    for reference in refs {
        let canonical = lookup(&reference).ok_or_else(|| ExtractionError::UnknownFeatureReference {
            feature: feature.to_string(),
            kind,
            name: reference.clone(),
        })?;
        if !resolved.contains(&canonical) {
            resolved.push(canonical);
        }
    }
    Ok(resolved)
}

fn resolve_features(
    raw: Vec<RawFeature>,
    screens: &[Screen],
    flows: &[Flow],
) -> Result<Vec<Feature>, ExtractionError> {
    let mut features: Vec<Feature> = Vec::with_capacity(raw.len());

    for (index, raw) in raw.into_iter().enumerate() {
        let name = required_name(&raw.name, "name", index, PHASE)?;
        let key = name_key(&name);
        if features.iter().any(|f| name_key(&f.name) == key) {
            warn!(feature = %name, "Skipping duplicate feature");
            continue;
        }

        let feature_flows = resolve_refs(&name, clean_list(raw.flows), "flow", |path| {
            let key = path_key(path);
            flows
                .iter()
                .find(|f| path_key(&f.flow) == key)
                .map(|f| f.flow.clone())
        })?;
        let feature_screens = resolve_refs(&name, clean_list(raw.screens), "screen", |screen| {
            let key = name_key(screen);
            screens
                .iter()
                .find(|s| name_key(&s.name) == key)
                .map(|s| s.name.clone())
        })?;

        features.push(Feature {
            description: raw.description.unwrap_or_default().trim().to_string(),
            flows: feature_flows,
            screens: feature_screens,
            entry_points: clean_list(raw.entry_points),
            success_criteria: clean_list(raw.success_criteria),
            failure_criteria: clean_list(raw.failure_criteria),
            name,
        });
    }

    Ok(features)
}

/// Splits the optional `app` record off the reply; the app name falls back
/// to the name the build was started with.
fn take_app(value: &mut Value, app_name: &str) -> Result<Option<AppInfo>, ExtractionError> {
    let raw = match value {
        Value::Object(map) => map.remove("app"),
        _ => None,
    };
    let raw: RawApp = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(app) => serde_json::from_value(app)
            .map_err(|e| ExtractionError::schema(PHASE, format!("app: {}", e)))?,
    };

    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| app_name.to_string());

    Ok(Some(AppInfo {
        name,
        description: raw.description.unwrap_or_default().trim().to_string(),
    }))
}

/// Optional fourth phase: app record and feature catalog over the screens
/// and flows already extracted.
pub struct FeaturesPhase;

#[async_trait]
impl ExtractionPhase for FeaturesPhase {
    fn name(&self) -> &'static str {
        PHASE
    }

    async fn execute(&self, context: &mut BuildContext) -> Result<usize, ExtractionError> {
        let prompt = build_prompt(
            &context.app_name,
            &context.transcript,
            &context.screens,
            &context.flows,
        );
        let mut value = query_llm_json(
            context.llm_client.as_ref(),
            SYSTEM_PROMPT,
            prompt,
            context.temperature,
            PHASE,
            &context.exchange_log,
        )
        .await
        .map_err(|e| ExtractionError::from_call(PHASE, e))?;

        let app = take_app(&mut value, &context.app_name)?;
        let raw: Vec<RawFeature> = parse_collection(value, "features", PHASE)?;
        let features = resolve_features(raw, &context.screens, &context.flows)?;
        debug!(count = features.len(), has_app = app.is_some(), "Extracted features");

        context.app = app;
        context.features = features;
        Ok(context.features.len())
    }
}
