//! CLI integration tests
//!
//! These run the compiled binary. Only paths that need no model backend are
//! exercised here: argument validation, screen/interaction/feature search
//! and error exit codes.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn flowscout(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flowscout"))
        .args(args)
        .env_clear()
        .output()
        .expect("Failed to execute flowscout")
}

#[test]
fn test_cli_help() {
    let output = flowscout(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("repository"));
    assert!(stdout.contains("query"));
}

#[test]
fn test_cli_version() {
    let output = flowscout(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("flowscout"));
}

#[test]
fn test_query_screens_json() {
    let repo = fixture("mailer.json");
    let output = flowscout(&[
        "query",
        "-r",
        repo.to_str().unwrap(),
        "--target",
        "screen",
        "--format",
        "json",
        "write a message with attachments",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["name"], "Compose");
}

#[test]
fn test_query_interactions_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("nested/interactions.yaml");
    let repo = fixture("mailer.json");

    let output = flowscout(&[
        "-q",
        "query",
        "-r",
        repo.to_str().unwrap(),
        "--target",
        "interaction",
        "--format",
        "yaml",
        "-o",
        out.to_str().unwrap(),
        "mute alerts",
    ]);
    assert!(output.status.success());

    let contents = fs::read_to_string(&out).unwrap();
    assert!(contents.contains("Toggle notifications"));
}

#[test]
fn test_query_features_json() {
    let repo = fixture("mailer.json");
    let output = flowscout(&[
        "query",
        "-r",
        repo.to_str().unwrap(),
        "--target",
        "feature",
        "--format",
        "json",
        "mute new mail alerts",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["name"], "Notification preferences");
    assert_eq!(value[0]["entry_points"][0], "Settings tab");
}

#[test]
fn test_query_missing_repository_exits_one() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    let output = flowscout(&[
        "query",
        "-r",
        missing.to_str().unwrap(),
        "--target",
        "screen",
        "anything",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
}

#[test]
fn test_query_unknown_app_exits_one() {
    let repo = fixture("mailer.json");
    let output = flowscout(&[
        "query",
        "-r",
        repo.to_str().unwrap(),
        "--app-name",
        "calendar",
        "--target",
        "screen",
        "anything",
    ]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_config_exits_one() {
    let repo = fixture("mailer.json");
    let output = Command::new(env!("CARGO_BIN_EXE_flowscout"))
        .args(["query", "-r", repo.to_str().unwrap(), "--target", "screen", "x"])
        .env_clear()
        .env("FLOWSCOUT_WEIGHT_ROLE", "0.9")
        .output()
        .expect("Failed to execute flowscout");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_repository_requires_transcript() {
    let output = flowscout(&["repository", "--app-name", "mailer"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("transcript"));
}
