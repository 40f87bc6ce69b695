//! Repository builder integration tests driven by MockLLMClient
//!
//! Each build makes exactly three model calls (screens, flows,
//! interactions), so tests queue three responses in that order.

use flowscout::llm::{BackendError, MockLLMClient, MockResponse};
use flowscout::pipeline::ExchangeLog;
use flowscout::progress::{ProgressEvent, ProgressHandler};
use flowscout::store::{load_repository, save_repository};
use flowscout::{ExtractionError, FeatureCategory, RepositoryBuilder};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const TRANSCRIPT: &str = "The user signs in on the login screen, lands on the inbox, \
opens compose, writes a message and taps send.";

fn screens_response() -> MockResponse {
    MockResponse::json(json!([
        {"name": "Login", "sequence_num": 1, "description": "Sign in form", "use": "authenticate"},
        {"name": "Home", "sequence_num": 2, "description": "Inbox", "use": "read mail"},
        {"name": "Compose", "sequence_num": 3, "description": "Message editor", "use": "write mail"}
    ]))
}

fn flows_response() -> MockResponse {
    MockResponse::text(
        "Here are the flows:\n```json\n[{\"flow\": \"login -> home -> compose -> send\", \
         \"screens\": [\"Login\", \"home\", \"Compose\"], \"user_type\": \"sender\", \
         \"feature_cat\": \"new-feature\", \"confidence\": 0.85}]\n```",
    )
}

fn interactions_response() -> MockResponse {
    MockResponse::json(json!({
        "interactions": [
            {"name": "Tap send", "use": "deliver the message", "description": "toolbar button",
             "flows": ["login -> home -> compose -> send"]},
            {"name": "Type body", "use": "write", "flows": ["Login->Home->Compose->Send"]}
        ]
    }))
}

fn mock_with_full_build() -> Arc<MockLLMClient> {
    let client = Arc::new(MockLLMClient::new());
    client.add_responses([screens_response(), flows_response(), interactions_response()]);
    client
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<String>>,
}

impl ProgressHandler for RecordingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        let label = match event {
            ProgressEvent::Started { .. } => "started".to_string(),
            ProgressEvent::PhaseStarted { phase } => format!("start:{}", phase),
            ProgressEvent::PhaseComplete { phase, .. } => format!("done:{}", phase),
            ProgressEvent::Completed { .. } => "completed".to_string(),
            ProgressEvent::Failed { phase, .. } => format!("failed:{}", phase),
        };
        self.events.lock().unwrap().push(label);
    }
}

#[tokio::test]
async fn test_full_build_produces_consistent_repository() {
    let client = mock_with_full_build();
    let repository = RepositoryBuilder::new(client.clone())
        .build(TRANSCRIPT, "mailer")
        .await
        .unwrap();

    assert_eq!(repository.app_name, "mailer");
    assert_eq!(repository.screens.len(), 3);
    assert_eq!(repository.flows.len(), 1);
    assert_eq!(repository.interactions.len(), 2);

    let flow = &repository.flows[0];
    assert_eq!(flow.user_type.as_deref(), Some("sender"));
    assert_eq!(flow.feature_cat, Some(FeatureCategory::NewFeature));
    let screen_names: Vec<_> = flow.screens.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(screen_names, vec!["Login", "Home", "Compose"]);
    assert_eq!(flow.interactions.len(), 2);

    assert!(repository.validate().is_ok());
    assert_eq!(client.requests().len(), 3);
    assert_eq!(client.remaining_responses(), 0);
}

#[tokio::test]
async fn test_later_prompts_include_earlier_results() {
    let client = mock_with_full_build();
    RepositoryBuilder::new(client.clone())
        .build(TRANSCRIPT, "mailer")
        .await
        .unwrap();

    let requests = client.requests();
    let flows_prompt = &requests[1].messages.last().unwrap().content;
    assert!(flows_prompt.contains("Compose"));
    let interactions_prompt = &requests[2].messages.last().unwrap().content;
    assert!(interactions_prompt.contains("login -> home -> compose -> send"));
}

#[tokio::test]
async fn test_unknown_screen_in_flow_fails() {
    let client = Arc::new(MockLLMClient::new());
    client.add_responses([
        screens_response(),
        MockResponse::json(json!([
            {"flow": "login -> checkout", "screens": ["Login", "Checkout"]}
        ])),
    ]);

    let err = RepositoryBuilder::new(client.clone())
        .build(TRANSCRIPT, "mailer")
        .await
        .unwrap_err();

    match err {
        ExtractionError::UnknownScreen { screen, .. } => assert_eq!(screen, "Checkout"),
        other => panic!("expected UnknownScreen, got {:?}", other),
    }
    assert_eq!(client.requests().len(), 2);
}

#[tokio::test]
async fn test_interaction_naming_unknown_flow_fails() {
    let client = Arc::new(MockLLMClient::new());
    client.add_responses([
        screens_response(),
        flows_response(),
        MockResponse::json(json!([
            {"name": "Tap archive", "flows": ["home -> archive"]}
        ])),
    ]);

    let err = RepositoryBuilder::new(client)
        .build(TRANSCRIPT, "mailer")
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::UnknownFlow { .. }));
}

#[tokio::test]
async fn test_non_json_response_fails_with_phase() {
    let client = Arc::new(MockLLMClient::new());
    client.add_response(MockResponse::text("I could not find any screens."));

    let err = RepositoryBuilder::new(client)
        .build(TRANSCRIPT, "mailer")
        .await
        .unwrap_err();

    match err {
        ExtractionError::InvalidJson { phase, .. } => assert_eq!(phase, "screens"),
        other => panic!("expected InvalidJson, got {:?}", other),
    }
}

#[tokio::test]
async fn test_backend_error_propagates() {
    let client = Arc::new(MockLLMClient::new());
    client.add_response(MockResponse::error(BackendError::TimeoutError { seconds: 60 }));

    let err = RepositoryBuilder::new(client)
        .build(TRANSCRIPT, "mailer")
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Backend { .. }));
}

#[tokio::test]
async fn test_progress_events_in_order() {
    let handler = Arc::new(RecordingHandler::default());
    RepositoryBuilder::new(mock_with_full_build())
        .with_progress_handler(handler.clone())
        .build(TRANSCRIPT, "mailer")
        .await
        .unwrap();

    let events = handler.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "started",
            "start:screens",
            "done:screens",
            "start:flows",
            "done:flows",
            "start:interactions",
            "done:interactions",
            "completed",
        ]
    );
}

#[tokio::test]
async fn test_exchange_log_records_each_call() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("exchanges.jsonl");

    RepositoryBuilder::new(mock_with_full_build())
        .with_exchange_log(Arc::new(ExchangeLog::new(Some(log_path.clone()))))
        .build(TRANSCRIPT, "mailer")
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let phases: Vec<String> = contents
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["phase"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(phases, vec!["screens", "flows", "interactions"]);
}

#[tokio::test]
async fn test_built_repository_round_trips_through_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mailer.json");

    let repository = RepositoryBuilder::new(mock_with_full_build())
        .build(TRANSCRIPT, "mailer")
        .await
        .unwrap();
    save_repository(&repository, &path).unwrap();

    assert_eq!(load_repository(&path).unwrap(), repository);
}
