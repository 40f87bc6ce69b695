//! Output formatting for query results and repositories
//!
//! JSON and YAML are plain serde renderings of the result types. The human
//! format is a compact, box-drawn summary meant for terminals.
//!
//! # Example
//!
//! ```ignore
//! use flowscout::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_query(&result)?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use serde::Serialize;

use crate::model::{QueryResult, Repository};
use crate::query::{FeatureMatch, InteractionMatch, ScreenMatch};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\
\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\
\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\
\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats ranked flows for a feature
    pub fn format_query(&self, result: &QueryResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(result, "query result"),
            OutputFormat::Yaml => to_yaml(result, "query result"),
            OutputFormat::Human => Ok(human_query(result)),
        }
    }

    pub fn format_repository(&self, repository: &Repository) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(repository, "repository"),
            OutputFormat::Yaml => to_yaml(repository, "repository"),
            OutputFormat::Human => Ok(human_repository(repository)),
        }
    }

    pub fn format_screens(&self, feature: &str, matches: &[ScreenMatch]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(matches, "screen matches"),
            OutputFormat::Yaml => to_yaml(matches, "screen matches"),
            OutputFormat::Human => Ok(human_matches(
                "Screens",
                feature,
                matches
                    .iter()
                    .map(|m| (m.screen.name.as_str(), m.screen.description.as_str(), m.similarity_score)),
            )),
        }
    }

    pub fn format_interactions(
        &self,
        feature: &str,
        matches: &[InteractionMatch],
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(matches, "interaction matches"),
            OutputFormat::Yaml => to_yaml(matches, "interaction matches"),
            OutputFormat::Human => Ok(human_matches(
                "Interactions",
                feature,
                matches.iter().map(|m| {
                    (
                        m.interaction.name.as_str(),
                        m.interaction.use_.as_str(),
                        m.similarity_score,
                    )
                }),
            )),
        }
    }

    pub fn format_features(&self, feature: &str, matches: &[FeatureMatch]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(matches, "feature matches"),
            OutputFormat::Yaml => to_yaml(matches, "feature matches"),
            OutputFormat::Human => Ok(human_matches(
                "Features",
                feature,
                matches.iter().map(|m| {
                    (
                        m.feature.name.as_str(),
                        m.feature.description.as_str(),
                        m.similarity_score,
                    )
                }),
            )),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {} to JSON", what))
}

fn to_yaml<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
}

fn score_bar(score: f64) -> String {
    let filled = (score.clamp(0.0, 1.0) * 10.0).round() as usize;
    "\u{2588}".repeat(filled) + &"\u{2591}".repeat(10 - filled)
}

fn human_query(result: &QueryResult) -> String {
    let mut output = String::new();

    output.push_str("Similar Flows\n");
    output.push_str(RULE);
    output.push_str("\n\n");
    output.push_str(&format!("Feature:    {}\n", result.feature));
    output.push_str(&format!("User Type:  {}\n", result.user_type));
    output.push_str(&format!("Category:   {}\n\n", result.feature_cat));

    if result.flows.is_empty() {
        output.push_str("No matching flows.\n");
        return output;
    }

    for (rank, flow) in result.flows.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} {:.2}  {}\n",
            rank + 1,
            score_bar(flow.similarity_score),
            flow.similarity_score,
            flow.flow
        ));
        let b = &flow.score_breakdown;
        output.push_str(&format!(
            "   \u{251C}\u{2500} role {:.2}  scale {:.2}  flow {:.2}\n",
            b.role_score, b.scale_score, b.flow_similarity
        ));
        if flow.interactions.is_empty() {
            output.push_str("   \u{2514}\u{2500} Interactions: (none)\n");
        } else {
            let names: Vec<&str> = flow.interactions.iter().map(|i| i.name.as_str()).collect();
            output.push_str(&format!(
                "   \u{2514}\u{2500} Interactions: {}\n",
                names.join(", ")
            ));
        }
    }

    output
}

fn human_repository(repository: &Repository) -> String {
    let mut output = String::new();

    output.push_str(&format!("\u{2713} Flow Repository: {}\n", repository.app_name));
    output.push_str(RULE);
    output.push_str("\n\n");

    if let Some(app) = &repository.app {
        output.push_str(&format!("App: {}\n", app.name));
        if !app.description.is_empty() {
            output.push_str(&format!("     {}\n", app.description));
        }
        output.push('\n');
    }

    output.push_str(&format!("Screens ({}):\n", repository.screens.len()));
    for screen in &repository.screens {
        output.push_str(&format!("  {:>3}. {}\n", screen.sequence_num, screen.name));
    }
    output.push('\n');

    output.push_str(&format!("Flows ({}):\n", repository.flows.len()));
    for flow in &repository.flows {
        let role = flow.user_type.as_deref().unwrap_or("-");
        let cat = flow
            .feature_cat
            .map(|c| c.as_str())
            .unwrap_or("-");
        output.push_str(&format!(
            "  - {} [{} / {} / {:.2}]\n",
            flow.flow, role, cat, flow.confidence
        ));
    }
    output.push('\n');

    output.push_str(&format!("Interactions ({}):\n", repository.interactions.len()));
    for interaction in &repository.interactions {
        output.push_str(&format!("  - {}\n", interaction.name));
    }

    if !repository.features.is_empty() {
        output.push_str(&format!("\nFeatures ({}):\n", repository.features.len()));
        for feature in &repository.features {
            output.push_str(&format!(
                "  - {} ({} flows, {} screens)\n",
                feature.name,
                feature.flows.len(),
                feature.screens.len()
            ));
        }
    }

    output
}

fn human_matches<'a>(
    title: &str,
    feature: &str,
    rows: impl Iterator<Item = (&'a str, &'a str, f64)>,
) -> String {
    let mut output = format!("Similar {}\n{}\n\nFeature: {}\n\n", title, RULE, feature);

    let mut any = false;
    for (rank, (name, detail, score)) in rows.enumerate() {
        any = true;
        output.push_str(&format!(
            "{}. {} {:.2}  {}\n",
            rank + 1,
            score_bar(score),
            score,
            name
        ));
        if !detail.is_empty() {
            output.push_str(&format!("   \u{2514}\u{2500} {}\n", detail));
        }
    }

    if !any {
        output.push_str(&format!("No matching {}.\n", title.to_lowercase()));
    }
    output
}
