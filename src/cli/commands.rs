use crate::model::FeatureCategory;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Product flow repository builder and similar-feature finder
#[derive(Parser, Debug)]
#[command(
    name = "flowscout",
    about = "Extract product flows from transcripts and find existing features similar to a request",
    version,
    author,
    long_about = "flowscout asks a language model to extract the screens, flows and interactions \
                  of a product from a demo transcript, then ranks those flows against proposed \
                  features so teams can check whether something similar already exists."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build a flow repository from a transcript",
        long_about = "Extracts screens, then flows, then interactions from a product transcript \
                      and writes the resulting repository as JSON. --features adds the app \
                      record and a feature catalog.\n\n\
                      Examples:\n  \
                      flowscout repository --app-name mailer --transcript-file demo.txt\n  \
                      flowscout repository --app-name mailer --transcript-file demo.txt --features \\\n    \
                      --meta video=demo.mp4 -o repo/mailer.json\n  \
                      flowscout repository --app-name mailer --transcript \"...\" -o repo/mailer.json"
    )]
    Repository(RepositoryArgs),

    #[command(
        about = "Find existing flows similar to a proposed feature",
        long_about = "Classifies the feature, scores every flow of the repository and prints \
                      the best matches.\n\n\
                      Examples:\n  \
                      flowscout query -r repo/mailer.json \"attach a file before sending\"\n  \
                      flowscout query -r repo/ --app-name mailer --user-type sender \\\n    \
                      --feature-cat new-feature \"schedule a message\" --format json"
    )]
    Query(QueryArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RepositoryArgs {
    #[arg(long, value_name = "NAME", help = "Application name the repository is keyed by")]
    pub app_name: String,

    #[arg(
        long,
        value_name = "TEXT",
        conflicts_with = "transcript_file",
        required_unless_present = "transcript_file",
        help = "Transcript text"
    )]
    pub transcript: Option<String>,

    #[arg(long, value_name = "FILE", help = "Read the transcript from a file")]
    pub transcript_file: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the repository to this file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "TEMP", default_value = "0.0", help = "Model temperature")]
    pub temperature: f32,

    #[arg(
        long,
        help = "Also extract the app record and feature catalog (one more model call)"
    )]
    pub features: bool,

    #[arg(
        long = "meta",
        value_name = "KEY=VALUE",
        value_parser = parse_key_value,
        help = "Metadata stored in the repository's source record (repeatable)"
    )]
    pub metadata: Vec<(String, String)>,
}

#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    #[arg(value_name = "FEATURE", help = "Free-text description of the proposed feature")]
    pub feature: String,

    #[arg(
        short = 'r',
        long,
        value_name = "PATH",
        help = "Repository JSON file, or a directory of them"
    )]
    pub repository: PathBuf,

    #[arg(long, value_name = "NAME", help = "App to query when several are loaded")]
    pub app_name: Option<String>,

    #[arg(long, value_name = "ROLE", help = "Role of the feature's user (skips inference)")]
    pub user_type: Option<String>,

    #[arg(
        long,
        value_name = "CATEGORY",
        value_parser = parse_feature_category,
        help = "new-feature, ui-improvement or ux-improvement (skips inference)"
    )]
    pub feature_cat: Option<FeatureCategory>,

    #[arg(long, value_name = "TEMP", default_value = "0.0", help = "Model temperature")]
    pub temperature: f32,

    #[arg(short = 'k', long, value_name = "N", help = "Number of results (1-10)")]
    pub top_k: Option<usize>,

    #[arg(long, value_enum, default_value = "flow", help = "What to search for")]
    pub target: TargetArg,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Also export the result as query_<timestamp>.json into DIR"
    )]
    pub export_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetArg {
    Flow,
    Screen,
    Interaction,
    Feature,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn parse_feature_category(s: &str) -> Result<FeatureCategory, String> {
    s.parse().map_err(|e: crate::model::ParseCategoryError| e.to_string())
}
