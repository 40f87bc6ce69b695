use super::common::{parse_collection, required_name};
use crate::model::{name_key, path_key, Flow, Interaction};
use crate::pipeline::llm_helper::query_llm_json;
use crate::pipeline::{BuildContext, ExtractionError, ExtractionPhase};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const PHASE: &str = "interactions";

const SYSTEM_PROMPT: &str = "You are a UX analyst listing the atomic user actions of a product \
from a demo transcript and its known flows. Respond with JSON only.";

#[derive(Debug, Deserialize)]
struct RawInteraction {
    name: String,
    #[serde(default, rename = "use")]
    use_: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    flows: Vec<String>,
}

fn build_prompt(app_name: &str, transcript: &str, flows: &[Flow]) -> String {
    let flow_list: Vec<String> = flows.iter().map(|f| format!("- {}", f.flow)).collect();

    format!(
        r#"List the atomic user interactions (taps, swipes, inputs) of the app "{}" in this transcript.

Transcript:
"""
{}
"""

Known flows:
{}

Respond with a JSON array, one object per interaction:
[
  {{"name": "Tap send", "use": "deliver the message", "description": "the send button in the compose toolbar", "flows": ["login -> home -> compose -> send"]}}
]

Rules:
- "name" is a short, unique action label
- "flows" lists the flows the interaction belongs to, copied exactly from the known flows"#,
        app_name,
        transcript,
        flow_list.join("\n")
    )
}

/// Builds the interaction collection and attaches each interaction to the
/// flows it names. The first interaction seen for a name is the canonical
/// entry; later ones with the same name attach that entry, never their own
/// copy, so every embedded interaction is also in the collection.
fn attach_interactions(
    raw: Vec<RawInteraction>,
    flows: &mut [Flow],
) -> Result<Vec<Interaction>, ExtractionError> {
    let flow_keys: Vec<String> = flows.iter().map(|f| path_key(&f.flow)).collect();
    let mut interactions: Vec<Interaction> = Vec::with_capacity(raw.len());

    for (index, raw) in raw.into_iter().enumerate() {
        let name = required_name(&raw.name, "name", index, PHASE)?;
        let key = name_key(&name);

        let canonical = match interactions.iter().position(|i| name_key(&i.name) == key) {
            Some(existing) => {
                debug!(name = %name, kept = %interactions[existing].name, "Duplicate interaction name");
                interactions[existing].clone()
            }
            None => {
                let interaction = Interaction {
                    name,
                    use_: raw.use_.unwrap_or_default().trim().to_string(),
                    description: raw.description.unwrap_or_default().trim().to_string(),
                };
                interactions.push(interaction.clone());
                interaction
            }
        };

        for flow_ref in &raw.flows {
            let position = flow_keys
                .iter()
                .position(|k| *k == path_key(flow_ref))
                .ok_or_else(|| ExtractionError::UnknownFlow {
                    interaction: canonical.name.clone(),
                    flow: flow_ref.clone(),
                })?;

            let flow = &mut flows[position];
            if !flow.interactions.iter().any(|i| name_key(&i.name) == key) {
                flow.interactions.push(canonical.clone());
            }
        }
    }

    Ok(interactions)
}

pub struct InteractionsPhase;

#[async_trait]
impl ExtractionPhase for InteractionsPhase {
    fn name(&self) -> &'static str {
        PHASE
    }

    async fn execute(&self, context: &mut BuildContext) -> Result<usize, ExtractionError> {
        let prompt = build_prompt(&context.app_name, &context.transcript, &context.flows);
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

        let raw: Vec<RawInteraction> = parse_collection(value, "interactions", PHASE)?;
        let interactions = attach_interactions(raw, &mut context.flows)?;
        debug!(count = interactions.len(), "Extracted interactions");

        context.interactions = interactions;
        Ok(context.interactions.len())
    }
}
