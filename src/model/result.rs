use super::{FeatureCategory, Flow, Interaction, Screen};
use serde::{Deserialize, Serialize};

/// The three sub-scores behind a flow's composite similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub role_score: f64,
    pub scale_score: f64,
    pub flow_similarity: f64,
}

/// A ranked flow with its full payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFlow {
    pub flow: String,
    pub screens: Vec<Screen>,
    pub interactions: Vec<Interaction>,
    pub similarity_score: f64,
    #[serde(default)]
    pub score_breakdown: ScoreBreakdown,
}

impl ScoredFlow {
    pub fn from_flow(flow: &Flow, similarity_score: f64, score_breakdown: ScoreBreakdown) -> Self {
        Self {
            flow: flow.flow.clone(),
            screens: flow.screens.clone(),
            interactions: flow.interactions.clone(),
            similarity_score,
            score_breakdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub feature: String,
    pub user_type: String,
    pub feature_cat: FeatureCategory,
    pub flows: Vec<ScoredFlow>,
}
