//! flowscout - product flow repositories and similar-feature search
//!
//! A language model reads a product demo transcript and extracts the
//! product's screens, the user flows through them and the interactions
//! along each flow. That repository can then be queried with a proposed
//! feature: the request is classified by user role and change scale, and
//! every flow is scored on role match, scale match and step similarity.
//!
//! # Core Concepts
//!
//! - **Repository**: screens, flows and interactions of one app, with every
//!   flow referencing only screens and interactions the repository defines
//! - **Builder**: three sequential model calls (screens, flows,
//!   interactions), each validated before the next runs, and an optional
//!   fourth call for the app record and feature catalog
//! - **Query**: classification followed by a pure, deterministic ranking
//!
//! # Example Usage
//!
//! ```ignore
//! use flowscout::{FeatureRequest, QueryEngine, QueryOptions, RepositoryBuilder};
//!
//! let repository = RepositoryBuilder::new(client.clone())
//!     .build(&transcript, "mailer")
//!     .await?;
//!
//! let engine = QueryEngine::new(client, QueryOptions::default());
//! let result = engine
//!     .query(&FeatureRequest::new("attach a file before sending"), &repository)
//!     .await?;
//! for flow in &result.flows {
//!     println!("{:.2} {}", flow.similarity_score, flow.flow);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod store;
pub mod util;

pub use config::{ConfigError, FlowscoutConfig};
pub use llm::{BackendError, GenAIClient, LLMClient, MockLLMClient, RecordingLLMClient};
pub use model::{
    AppInfo, Feature, FeatureCategory, Flow, Interaction, QueryResult, Repository, Screen,
    ScoreBreakdown, ScoredFlow, SourceInfo,
};
pub use pipeline::{ExtractionError, RepositoryBuilder};
pub use query::{FeatureRequest, QueryEngine, QueryError, QueryOptions, ScoringWeights};
pub use store::{RepositoryStore, StoreError};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
