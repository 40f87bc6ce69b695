use super::exchange_log::ExchangeLog;
use crate::llm::LLMClient;
use crate::model::{AppInfo, Feature, Flow, Interaction, Repository, Screen, SourceInfo};
use std::sync::Arc;

/// State threaded through the extraction phases. Each phase reads what the
/// previous ones produced and fills in its own collection.
pub struct BuildContext {
    pub app_name: String,
    pub transcript: String,
    pub llm_client: Arc<dyn LLMClient>,
    pub exchange_log: Arc<ExchangeLog>,
    pub temperature: f32,
    pub screens: Vec<Screen>,
    pub flows: Vec<Flow>,
    pub interactions: Vec<Interaction>,
    pub source: Option<SourceInfo>,
    pub app: Option<AppInfo>,
    pub features: Vec<Feature>,
}

impl BuildContext {
    pub fn new(
        app_name: impl Into<String>,
        transcript: impl Into<String>,
        llm_client: Arc<dyn LLMClient>,
        exchange_log: Arc<ExchangeLog>,
        temperature: f32,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            transcript: transcript.into(),
            llm_client,
            exchange_log,
            temperature,
            screens: Vec::new(),
            flows: Vec::new(),
            interactions: Vec::new(),
            source: None,
            app: None,
            features: Vec::new(),
        }
    }

    pub fn into_repository(self) -> Repository {
        Repository {
            app_name: self.app_name,
            source: self.source,
            app: self.app,
            features: self.features,
            screens: self.screens,
            flows: self.flows,
            interactions: self.interactions,
        }
    }
}
