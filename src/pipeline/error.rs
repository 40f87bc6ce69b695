use super::llm_helper::LlmCallError;
use crate::llm::BackendError;
use crate::model::IntegrityError;
use thiserror::Error;

/// Why a repository build failed. No partial repository survives any of these.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid build input: {0}")]
    InvalidInput(String),

    #[error("{phase} extraction: model call failed: {source}")]
    Backend {
        phase: String,
        #[source]
        source: BackendError,
    },

    #[error("{phase} extraction: {message} (response: {content})")]
    InvalidJson {
        phase: String,
        message: String,
        content: String,
    },

    #[error("{phase} extraction: {message}")]
    Schema { phase: String, message: String },

    #[error("Flow '{flow}' references unknown screen '{screen}'")]
    UnknownScreen { flow: String, screen: String },

    #[error("Interaction '{interaction}' references unknown flow '{flow}'")]
    UnknownFlow { interaction: String, flow: String },

    /// `kind` is `"flow"` or `"screen"`
    #[error("Feature '{feature}' references unknown {kind} '{name}'")]
    UnknownFeatureReference {
        feature: String,
        kind: &'static str,
        name: String,
    },
}

impl ExtractionError {
    pub(crate) fn from_call(phase: &str, err: LlmCallError) -> Self {
        match err {
            LlmCallError::Backend(source) => ExtractionError::Backend {
                phase: phase.to_string(),
                source,
            },
            LlmCallError::InvalidJson { message, content } => ExtractionError::InvalidJson {
                phase: phase.to_string(),
                message,
                content,
            },
        }
    }

    pub(crate) fn schema(phase: &str, message: impl Into<String>) -> Self {
        ExtractionError::Schema {
            phase: phase.to_string(),
            message: message.into(),
        }
    }
}

impl From<IntegrityError> for ExtractionError {
    fn from(err: IntegrityError) -> Self {
        match err {
            IntegrityError::UnknownScreen { flow, screen } => {
                ExtractionError::UnknownScreen { flow, screen }
            }
            IntegrityError::UnknownInteraction { .. } => {
                ExtractionError::schema("interactions", err.to_string())
            }
            IntegrityError::UnknownFeatureFlow { feature, flow } => {
                ExtractionError::UnknownFeatureReference {
                    feature,
                    kind: "flow",
                    name: flow,
                }
            }
            IntegrityError::UnknownFeatureScreen { feature, screen } => {
                ExtractionError::UnknownFeatureReference {
                    feature,
                    kind: "screen",
                    name: screen,
                }
            }
        }
    }
}
