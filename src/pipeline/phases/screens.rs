use super::common::{parse_collection, required_name};
use crate::pipeline::llm_helper::query_llm_json;
use crate::pipeline::{BuildContext, ExtractionError, ExtractionPhase};
use crate::model::Screen;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const PHASE: &str = "screens";

const SYSTEM_PROMPT: &str = "You are a UX analyst cataloguing the screens of a product from a \
demo transcript. Respond with JSON only.";

#[derive(Debug, Deserialize)]
struct RawScreen {
    name: String,
    #[serde(default)]
    sequence_num: Option<u32>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "use")]
    use_: Option<String>,
}

fn build_prompt(app_name: &str, transcript: &str) -> String {
    format!(
        r#"List every distinct screen of the app "{}" that appears in this transcript.

Transcript:
"""
{}
"""

Respond with a JSON array, one object per screen, in the order screens first appear:
[
  {{"name": "Inbox", "sequence_num": 1, "description": "what the screen shows", "use": "what the user does there"}}
]

Rules:
- "name" is a short, unique screen title
- "sequence_num" starts at 1 and follows first appearance
- Do not invent screens the transcript never mentions"#,
        app_name, transcript
    )
}

fn into_screens(raw: Vec<RawScreen>) -> Result<Vec<Screen>, ExtractionError> {
    let mut screens = raw
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            Ok(Screen {
                name: required_name(&raw.name, "name", index, PHASE)?,
                sequence_num: raw.sequence_num.unwrap_or(index as u32 + 1),
                description: raw.description.unwrap_or_default().trim().to_string(),
                use_: raw.use_.unwrap_or_default().trim().to_string(),
            })
        })
        .collect::<Result<Vec<_>, ExtractionError>>()?;

    screens.sort_by_key(|s| s.sequence_num);
    Ok(screens)
}

pub struct ScreensPhase;

#[async_trait]
impl ExtractionPhase for ScreensPhase {
    fn name(&self) -> &'static str {
        PHASE
    }

    async fn execute(&self, context: &mut BuildContext) -> Result<usize, ExtractionError> {
        let prompt = build_prompt(&context.app_name, &context.transcript);
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

        let raw: Vec<RawScreen> = parse_collection(value, "screens", PHASE)?;
        let screens = into_screens(raw)?;
        debug!(count = screens.len(), "Extracted screens");

        context.screens = screens;
        Ok(context.screens.len())
    }
}
