use super::similarity::tokenize;
use crate::config::{ConfigError, DEFAULT_TOP_K};
use crate::model::{FeatureCategory, ScoreBreakdown};
use std::collections::HashSet;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;
const MAX_TOP_K: usize = 10;
const IMPROVEMENT_AFFINITY: f64 = 0.5;

/// Weights of the three sub-scores in the composite similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub role: f64,
    pub scale: f64,
    pub flow_similarity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            role: 0.4,
            scale: 0.2,
            flow_similarity: 0.4,
        }
    }
}

impl ScoringWeights {
    /// Each weight within [0, 1] and the three summing to 1
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("role", self.role),
            ("scale", self.scale),
            ("flow_similarity", self.flow_similarity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationFailed(format!(
                    "Weight {} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        let sum = self.role + self.scale + self.flow_similarity;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::ValidationFailed(format!(
                "Scoring weights must sum to 1, got {}",
                sum
            )));
        }

        Ok(())
    }

    pub fn composite(&self, breakdown: &ScoreBreakdown) -> f64 {
        let score = breakdown.role_score * self.role
            + breakdown.scale_score * self.scale
            + breakdown.flow_similarity * self.flow_similarity;

        score.clamp(0.0, 1.0)
    }
}

/// `None` becomes the default; anything else is clamped to 1..=10
pub fn sanitize_top_k(value: Option<usize>) -> usize {
    match value {
        None => DEFAULT_TOP_K,
        Some(k) => k.clamp(1, MAX_TOP_K),
    }
}

fn normalize_role(role: &str) -> String {
    role.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 1 on equal roles, token Jaccard overlap otherwise, 0 for an untagged flow
pub fn role_score(requested: &str, flow_role: Option<&str>) -> f64 {
    let Some(flow_role) = flow_role else {
        return 0.0;
    };

    let requested_norm = normalize_role(requested);
    let flow_norm = normalize_role(flow_role);
    if requested_norm.is_empty() || flow_norm.is_empty() {
        return 0.0;
    }
    if requested_norm == flow_norm {
        return 1.0;
    }

    let a: HashSet<String> = tokenize(&requested_norm).into_iter().collect();
    let b: HashSet<String> = tokenize(&flow_norm).into_iter().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// 1 for equal categories, 0.5 between the two improvement kinds, else 0
pub fn scale_score(requested: FeatureCategory, flow_cat: Option<FeatureCategory>) -> f64 {
    match flow_cat {
        Some(cat) if cat == requested => 1.0,
        Some(cat) if cat.is_improvement() && requested.is_improvement() => IMPROVEMENT_AFFINITY,
        _ => 0.0,
    }
}
