use super::common::{parse_collection, required_name};
use crate::model::{name_key, FeatureCategory, Flow, Screen};
use crate::pipeline::llm_helper::query_llm_json;
use crate::pipeline::{BuildContext, ExtractionError, ExtractionPhase};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

const PHASE: &str = "flows";

const SYSTEM_PROMPT: &str = "You are a UX analyst describing the user flows of a product from a \
demo transcript and its known screens. Respond with JSON only.";

#[derive(Debug, Deserialize)]
struct RawFlow {
    flow: String,
    #[serde(default)]
    screens: Vec<String>,
    #[serde(default)]
    user_type: Option<String>,
    #[serde(default)]
    feature_cat: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn build_prompt(app_name: &str, transcript: &str, screens: &[Screen]) -> String {
    let screen_list: Vec<String> = screens
        .iter()
        .map(|s| format!("- {} (#{}): {}", s.name, s.sequence_num, s.description))
        .collect();

    format!(
        r#"Describe the user flows of the app "{}" shown in this transcript.

Transcript:
"""
{}
"""

Known screens:
{}

Respond with a JSON array, one object per flow:
[
  {{
    "flow": "login -> home -> compose -> send",
    "screens": ["Login", "Home", "Compose"],
    "user_type": "sender",
    "feature_cat": "new-feature",
    "confidence": 0.8
  }}
]

Rules:
- "flow" is the ordered path of steps joined with " -> "
- "screens" uses ONLY names from the known screens list, in traversal order
- "user_type" is the role of the person performing the flow
- "feature_cat" is one of: new-feature, ui-improvement, ux-improvement
- "confidence" is between 0.0 and 1.0"#,
        app_name,
        transcript,
        screen_list.join("\n")
    )
}

fn parse_category(raw: Option<String>, flow: &str) -> Option<FeatureCategory> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    match raw.parse() {
        Ok(category) => Some(category),
        Err(e) => {
            warn!(flow, "Dropping feature category: {}", e);
            None
        }
    }
}

fn clamp_confidence(confidence: Option<f64>, flow: &str) -> f64 {
    let value = confidence.unwrap_or(0.0);
    if !value.is_finite() {
        warn!(flow, "Non-finite confidence replaced with 0.0");
        return 0.0;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        warn!(flow, confidence = value, "Confidence clamped to [0, 1]");
    }
    clamped
}

fn resolve_flows(raw: Vec<RawFlow>, screens: &[Screen]) -> Result<Vec<Flow>, ExtractionError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let path = required_name(&raw.flow, "flow", index, PHASE)?;

            let flow_screens = raw
                .screens
                .iter()
                .map(|name| {
                    let key = name_key(name);
                    screens
                        .iter()
                        .find(|s| name_key(&s.name) == key)
                        .cloned()
                        .ok_or_else(|| ExtractionError::UnknownScreen {
                            flow: path.clone(),
                            screen: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Flow {
                feature_cat: parse_category(raw.feature_cat, &path),
                confidence: clamp_confidence(raw.confidence, &path),
                user_type: raw
                    .user_type
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty()),
                screens: flow_screens,
                interactions: Vec::new(),
                flow: path,
            })
        })
        .collect()
}

pub struct FlowsPhase;

#[async_trait]
impl ExtractionPhase for FlowsPhase {
    fn name(&self) -> &'static str {
        PHASE
    }

    async fn execute(&self, context: &mut BuildContext) -> Result<usize, ExtractionError> {
        let prompt = build_prompt(&context.app_name, &context.transcript, &context.screens);
        let value = query_llm_json(
            context.llm_client.as_ref(),
            SYSTEM_PROMPT,
            prompt,
            context.temperature,
            PHASE,
            &context.exchange_log,
        )
        .await
        .map_err(|e| ExtractionError::from_call(PHASE, e))?;

        let raw: Vec<RawFlow> = parse_collection(value, "flows", PHASE)?;
        let flows = resolve_flows(raw, &context.screens)?;
        debug!(count = flows.len(), "Extracted flows");

        context.flows = flows;
        Ok(context.flows.len())
    }
}
