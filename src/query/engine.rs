use super::classify::{classify, Classification, FeatureRequest};
use super::error::QueryError;
use super::scoring::{role_score, sanitize_top_k, scale_score, ScoringWeights};
use super::similarity::{sequence_similarity, tokenize};
use crate::config::{FlowscoutConfig, DEFAULT_TOP_K};
use crate::llm::LLMClient;
use crate::model::{QueryResult, Repository, ScoreBreakdown, ScoredFlow};
use crate::pipeline::ExchangeLog;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub top_k: usize,
    pub min_score: f64,
    pub weights: ScoringWeights,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: 0.0,
            weights: ScoringWeights::default(),
        }
    }
}

impl From<&FlowscoutConfig> for QueryOptions {
    fn from(config: &FlowscoutConfig) -> Self {
        Self {
            top_k: config.effective_top_k(),
            min_score: config.min_score,
            weights: config.weights,
        }
    }
}

/// Scores and ranks every flow against a classified request.
///
/// Pure: the same classification, feature text and repository always give
/// the same ordering and scores. Ties keep declaration order.
pub fn rank_flows(
    classification: &Classification,
    feature: &str,
    repository: &Repository,
    options: &QueryOptions,
) -> Vec<ScoredFlow> {
    let query_tokens = if classification.actions.is_empty() {
        tokenize(feature)
    } else {
        tokenize(&classification.actions.join(" "))
    };

    let mut scored: Vec<ScoredFlow> = repository
        .flows
        .iter()
        .map(|flow| {
            let breakdown = ScoreBreakdown {
                role_score: role_score(&classification.user_type, flow.user_type.as_deref()),
                scale_score: scale_score(classification.feature_cat, flow.feature_cat),
                flow_similarity: sequence_similarity(&query_tokens, &flow.steps()),
            };
            let score = options.weights.composite(&breakdown);
            debug!(flow = %flow.flow, score, ?breakdown, "Scored flow");
            ScoredFlow::from_flow(flow, score, breakdown)
        })
        .collect();

    // sort_by is stable, so equal scores keep declaration order
    scored.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    scored.retain(|f| f.similarity_score >= options.min_score);
    scored.truncate(sanitize_top_k(Some(options.top_k)));
    scored
}

/// Answers "what similar feature exists" against a repository.
pub struct QueryEngine {
    llm_client: Arc<dyn LLMClient>,
    options: QueryOptions,
    exchange_log: Arc<ExchangeLog>,
}

impl QueryEngine {
    pub fn new(llm_client: Arc<dyn LLMClient>, options: QueryOptions) -> Self {
        Self {
            llm_client,
            options,
            exchange_log: Arc::new(ExchangeLog::disabled()),
        }
    }

    pub fn with_exchange_log(mut self, exchange_log: Arc<ExchangeLog>) -> Self {
        self.exchange_log = exchange_log;
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub async fn query(
        &self,
        request: &FeatureRequest,
        repository: &Repository,
    ) -> Result<QueryResult, QueryError> {
        if repository.flows.is_empty() {
            return Err(QueryError::EmptyRepository {
                app_name: repository.app_name.clone(),
            });
        }

        let feature = request.feature.trim();
        if feature.is_empty() {
            return Err(QueryError::InvalidRequest(
                "feature text must not be empty".to_string(),
            ));
        }

        let classification = classify(
            self.llm_client.as_ref(),
            request,
            repository,
            &self.exchange_log,
        )
        .await?;
        info!(
            user_type = %classification.user_type,
            feature_cat = %classification.feature_cat,
            actions = classification.actions.len(),
            "Feature classified"
        );

        let flows = rank_flows(&classification, feature, repository, &self.options);
        info!(
            candidates = repository.flows.len(),
            returned = flows.len(),
            "Flows ranked"
        );

        Ok(QueryResult {
            feature: feature.to_string(),
            user_type: classification.user_type,
            feature_cat: classification.feature_cat,
            flows,
        })
    }
}
