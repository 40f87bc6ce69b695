use crate::llm::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Repository '{app_name}' has no flows to query")]
    EmptyRepository { app_name: String },

    #[error("Invalid query: {0}")]
    InvalidRequest(String),

    #[error("Feature classification failed: {0}")]
    Classification(String),

    #[error("Classification model call failed: {0}")]
    Backend(#[from] BackendError),
}
