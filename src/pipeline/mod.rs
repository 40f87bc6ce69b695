//! Repository builder: transcript in, validated [`crate::model::Repository`] out.

pub mod builder;
pub mod context;
pub mod error;
pub mod exchange_log;
pub mod llm_helper;
pub mod phase_trait;
pub mod phases;

pub use builder::RepositoryBuilder;
pub use context::BuildContext;
pub use error::ExtractionError;
pub use exchange_log::ExchangeLog;
pub use llm_helper::{extract_json, LlmCallError};
pub use phase_trait::ExtractionPhase;
