//! Model client errors

use thiserror::Error;

/// Failure of a single model exchange. Extraction and query code wrap this
/// with the phase it happened in.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The provider answered with an error or could not be reached
    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Request timed out after {seconds} seconds")]
    TimeoutError { seconds: u64 },

    #[error("{message}")]
    Other { message: String },
}
