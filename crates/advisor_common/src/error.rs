//! Error types for the advisor pipeline.

use thiserror::Error;

/// Error taxonomy for the recommendation pipeline.
///
/// Only `InvalidQuery` is expected to cross the pipeline boundary as an
/// error; retrieval and gateway failures are absorbed into a fallback
/// response by the pipeline itself.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Retrieval failure: {0}")]
    Retrieval(String),

    #[error("LLM gateway failure: {0}")]
    LlmGateway(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Course store error: {0}")]
    Store(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
