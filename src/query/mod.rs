//! Query engine: classify a feature request, score every flow, rank.

pub mod classify;
pub mod engine;
pub mod error;
pub mod scoring;
pub mod search;
pub mod similarity;

pub use classify::{classify, Classification, FeatureRequest};
pub use engine::{rank_flows, QueryEngine, QueryOptions};
pub use error::QueryError;
pub use scoring::{role_score, sanitize_top_k, scale_score, ScoringWeights};
pub use search::{
    search_features, search_interactions, search_screens, FeatureMatch, InteractionMatch,
    ScreenMatch,
};
