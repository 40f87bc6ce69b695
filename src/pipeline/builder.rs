use super::context::BuildContext;
use super::error::ExtractionError;
use super::exchange_log::ExchangeLog;
use super::phase_trait::ExtractionPhase;
use super::phases::{FeaturesPhase, FlowsPhase, InteractionsPhase, ScreensPhase};
use crate::llm::LLMClient;
use crate::model::{Repository, SourceInfo};
use crate::progress::{ProgressEvent, ProgressHandler};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Turns a transcript into a [`Repository`] with three sequential model
/// calls: screens, then flows over those screens, then interactions over
/// those flows. With [`with_feature_catalog`](Self::with_feature_catalog) a
/// fourth call adds the app record and feature catalog.
pub struct RepositoryBuilder {
    llm_client: Arc<dyn LLMClient>,
    exchange_log: Arc<ExchangeLog>,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
    temperature: f32,
    feature_catalog: bool,
    metadata: Map<String, Value>,
}

impl RepositoryBuilder {
    pub fn new(llm_client: Arc<dyn LLMClient>) -> Self {
        Self {
            llm_client,
            exchange_log: Arc::new(ExchangeLog::disabled()),
            progress_handler: None,
            temperature: 0.0,
            feature_catalog: false,
            metadata: Map::new(),
        }
    }

    pub fn with_exchange_log(mut self, exchange_log: Arc<ExchangeLog>) -> Self {
        self.exchange_log = exchange_log;
        self
    }

    pub fn with_progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_feature_catalog(mut self, enabled: bool) -> Self {
        self.feature_catalog = enabled;
        self
    }

    /// Recorded in the repository's `source` record
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }

    pub async fn build(
        &self,
        transcript: &str,
        app_name: &str,
    ) -> Result<Repository, ExtractionError> {
        if app_name.trim().is_empty() {
            return Err(ExtractionError::InvalidInput(
                "app name must not be empty".to_string(),
            ));
        }
        if transcript.trim().is_empty() {
            return Err(ExtractionError::InvalidInput(
                "transcript must not be empty".to_string(),
            ));
        }

        let start = Instant::now();
        info!(app = app_name, "Starting repository build");
        self.emit(ProgressEvent::Started {
            app_name: app_name.to_string(),
            transcript_chars: transcript.chars().count(),
        });

        let mut context = BuildContext::new(
            app_name.trim(),
            transcript,
            self.llm_client.clone(),
            self.exchange_log.clone(),
            self.temperature,
        );

        context.source = Some(SourceInfo {
            app_name: context.app_name.clone(),
            metadata: self.metadata.clone(),
        });

        let mut phases: Vec<Box<dyn ExtractionPhase>> = vec![
            Box::new(ScreensPhase),
            Box::new(FlowsPhase),
            Box::new(InteractionsPhase),
        ];
        if self.feature_catalog {
            phases.push(Box::new(FeaturesPhase));
        }

        for phase in phases {
            let phase_name = phase.name();
            info!("Phase: {}", phase_name);
            self.emit(ProgressEvent::PhaseStarted { phase: phase_name });

            let phase_start = Instant::now();
            let items = match phase.execute(&mut context).await {
                Ok(items) => items,
                Err(e) => {
                    self.emit(ProgressEvent::Failed {
                        phase: phase_name,
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            };

            self.emit(ProgressEvent::PhaseComplete {
                phase: phase_name,
                items,
                duration: phase_start.elapsed(),
            });
            debug!("Phase {} complete with {} items", phase_name, items);
        }

        let repository = context.into_repository();
        repository.validate()?;

        info!(
            screens = repository.screens.len(),
            flows = repository.flows.len(),
            interactions = repository.interactions.len(),
            "Repository build complete"
        );
        self.emit(ProgressEvent::Completed {
            screens: repository.screens.len(),
            flows: repository.flows.len(),
            interactions: repository.interactions.len(),
            total_time: start.elapsed(),
        });

        Ok(repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLLMClient, MockResponse};
    use serde_json::json;

    #[tokio::test]
    async fn test_rejects_blank_input_without_model_call() {
        let client = Arc::new(MockLLMClient::new());
        let builder = RepositoryBuilder::new(client.clone());

        let err = builder.build("   ", "mailer").await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidInput(_)));

        let err = builder.build("transcript", "").await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidInput(_)));

        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_phases_run_in_order() {
        let client = Arc::new(MockLLMClient::new());
        client.add_responses(vec![
            MockResponse::json(json!([{"name": "Login", "description": "", "use": ""}])),
            MockResponse::json(json!({"flows": [{"flow": "login", "screens": ["Login"]}]})),
            MockResponse::json(json!([{"name": "Tap login", "flows": ["login"]}])),
        ]);

        let repository = RepositoryBuilder::new(client.clone())
            .build("The user logs in.", "mailer")
            .await
            .unwrap();

        assert_eq!(repository.app_name, "mailer");
        assert_eq!(repository.flows[0].interactions[0].name, "Tap login");

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].messages[1].content.contains("- Login (#1)"));
        assert!(requests[2].messages[1].content.contains("- login"));
    }

    #[tokio::test]
    async fn test_failed_phase_stops_build() {
        let client = Arc::new(MockLLMClient::new());
        client.add_responses(vec![
            MockResponse::text("not json at all"),
            MockResponse::text("[]"),
        ]);

        let err = RepositoryBuilder::new(client.clone())
            .build("transcript", "mailer")
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::InvalidJson { ref phase, .. } if phase == "screens"));
        assert_eq!(client.remaining_responses(), 1);
    }

    #[tokio::test]
    async fn test_feature_catalog_adds_fourth_call() {
        let client = Arc::new(MockLLMClient::new());
        client.add_responses(vec![
            MockResponse::json(json!([{"name": "Login"}])),
            MockResponse::json(json!([{"flow": "login", "screens": ["Login"]}])),
            MockResponse::json(json!([])),
            MockResponse::json(json!({
                "app": {"name": "Mailer", "description": "Email client"},
                "features": [{"name": "Sign in", "flows": ["LOGIN"], "screens": ["login"]}]
            })),
        ]);

        let mut metadata = Map::new();
        metadata.insert("source".to_string(), Value::String("demo.mp4".to_string()));

        let repository = RepositoryBuilder::new(client.clone())
            .with_feature_catalog(true)
            .with_metadata(metadata)
            .build("The user logs in.", "mailer")
            .await
            .unwrap();

        assert_eq!(client.requests().len(), 4);
        assert_eq!(repository.app.as_ref().map(|a| a.name.as_str()), Some("Mailer"));
        assert_eq!(repository.features[0].flows, vec!["login"]);
        assert_eq!(repository.features[0].screens, vec!["Login"]);

        let source = repository.source.as_ref().unwrap();
        assert_eq!(source.app_name, "mailer");
        assert_eq!(source.metadata["source"], "demo.mp4");
    }

    #[tokio::test]
    async fn test_catalog_off_by_default() {
        let client = Arc::new(MockLLMClient::new());
        client.add_responses(vec![
            MockResponse::json(json!([{"name": "Login"}])),
            MockResponse::json(json!([{"flow": "login", "screens": ["Login"]}])),
            MockResponse::json(json!([])),
        ]);

        let repository = RepositoryBuilder::new(client.clone())
            .build("The user logs in.", "mailer")
            .await
            .unwrap();

        assert_eq!(client.requests().len(), 3);
        assert!(repository.features.is_empty());
        assert!(repository.app.is_none());
        assert!(repository.source.is_some());
    }
}
