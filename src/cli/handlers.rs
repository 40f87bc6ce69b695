//! Subcommand handlers. Each returns the process exit code.

use super::commands::{QueryArgs, RepositoryArgs, TargetArg};
use super::output::OutputFormatter;
use crate::config::FlowscoutConfig;
use crate::llm::{select_llm_client, LLMClient, RecordingLLMClient, RECORDING_MODE_ENV};
use crate::pipeline::{ExchangeLog, RepositoryBuilder};
use crate::progress::LoggingHandler;
use crate::query::{
    sanitize_top_k, search_features, search_interactions, search_screens, FeatureRequest,
    QueryEngine, QueryOptions,
};
use crate::store::{export_query_result, save_repository, RepositoryStore};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

pub async fn handle_repository(args: &RepositoryArgs) -> i32 {
    finish(run_repository(args).await)
}

pub async fn handle_query(args: &QueryArgs) -> i32 {
    finish(run_query(args).await)
}

async fn run_repository(args: &RepositoryArgs) -> Result<()> {
    let config = load_config(None)?;
    let client = create_client(&config).await?;
    execute_repository(args, &config, client).await
}

async fn run_query(args: &QueryArgs) -> Result<()> {
    let config = load_config(args.top_k)?;
    let client = match args.target {
        TargetArg::Flow => Some(create_client(&config).await?),
        TargetArg::Screen | TargetArg::Interaction | TargetArg::Feature => None,
    };
    execute_query(args, &config, client).await
}

fn finish(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn load_config(top_k: Option<usize>) -> Result<FlowscoutConfig> {
    let mut config = FlowscoutConfig::from_env().context("Failed to read configuration")?;
    if let Some(k) = top_k {
        config.top_k = sanitize_top_k(Some(k));
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn create_client(config: &FlowscoutConfig) -> Result<Arc<dyn LLMClient>> {
    let selected = select_llm_client(config)
        .await
        .context("Failed to select LLM backend")?;
    info!(provider = ?selected.provider, "Using {}", selected.description);

    if std::env::var(RECORDING_MODE_ENV).is_ok() {
        let recording = RecordingLLMClient::from_env(selected.client)
            .context("Failed to set up recording client")?;
        return Ok(Arc::new(recording));
    }

    Ok(selected.client)
}

fn read_transcript(args: &RepositoryArgs) -> Result<String> {
    match (&args.transcript, &args.transcript_file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript file {}", path.display())),
        (None, None) => Err(anyhow::anyhow!(
            "Either --transcript or --transcript-file is required"
        )),
    }
}

fn write_output(output: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!(path = %path.display(), "Output written");
        }
        None => println!("{}", output),
    }
    Ok(())
}

/// Builds a repository and writes it to `--output` or stdout
pub async fn execute_repository(
    args: &RepositoryArgs,
    config: &FlowscoutConfig,
    client: Arc<dyn LLMClient>,
) -> Result<()> {
    let transcript = read_transcript(args)?;

    let metadata = args
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
        .collect();

    let builder = RepositoryBuilder::new(client)
        .with_exchange_log(Arc::new(ExchangeLog::new(config.exchange_log.clone())))
        .with_progress_handler(Arc::new(LoggingHandler))
        .with_temperature(args.temperature)
        .with_feature_catalog(args.features)
        .with_metadata(metadata);

    let repository = builder
        .build(&transcript, &args.app_name)
        .await
        .with_context(|| format!("Failed to build repository for '{}'", args.app_name))?;

    match &args.output {
        Some(path) => save_repository(&repository, path)
            .with_context(|| format!("Failed to save repository to {}", path.display()))?,
        None => {
            let json = serde_json::to_string_pretty(&repository)
                .context("Failed to serialize repository")?;
            println!("{}", json);
        }
    }

    Ok(())
}

/// Loads repositories, runs the requested search and writes the formatted
/// result. `client` is only used for the flow target.
pub async fn execute_query(
    args: &QueryArgs,
    config: &FlowscoutConfig,
    client: Option<Arc<dyn LLMClient>>,
) -> Result<()> {
    let mut store = RepositoryStore::new();
    store
        .load_path(&args.repository)
        .with_context(|| format!("Failed to load repository from {}", args.repository.display()))?;
    let repository = store.resolve(args.app_name.as_deref())?;

    let formatter = OutputFormatter::new(args.format.into());
    let limit = config.effective_top_k();

    let output = match args.target {
        TargetArg::Screen => {
            formatter.format_screens(&args.feature, &search_screens(&args.feature, repository, limit))?
        }
        TargetArg::Interaction => formatter.format_interactions(
            &args.feature,
            &search_interactions(&args.feature, repository, limit),
        )?,
        TargetArg::Feature => {
            if repository.features.is_empty() {
                warn!(
                    app = %repository.app_name,
                    "Repository has no feature catalog; rebuild it with --features"
                );
            }
            formatter.format_features(
                &args.feature,
                &search_features(&args.feature, repository, limit),
            )?
        }
        TargetArg::Flow => {
            let client = client.context("Flow queries need an LLM client")?;
            let engine = QueryEngine::new(client, QueryOptions::from(config))
                .with_exchange_log(Arc::new(ExchangeLog::new(config.exchange_log.clone())));

            let mut request =
                FeatureRequest::new(args.feature.clone()).with_temperature(args.temperature);
            if let Some(user_type) = &args.user_type {
                request = request.with_user_type(user_type.clone());
            }
            if let Some(feature_cat) = args.feature_cat {
                request = request.with_feature_cat(feature_cat);
            }

            let result = engine
                .query(&request, repository)
                .await
                .with_context(|| format!("Query against '{}' failed", repository.app_name))?;

            if let Some(dir) = &args.export_dir {
                export_query_result(&repository.app_name, &result, dir)
                    .context("Failed to export query result")?;
            }

            formatter.format_query(&result)?
        }
    };

    write_output(&output, args.output.as_deref())
}
