//! Error types for the sitegen generation pipeline.

use crate::types::{AgentKind, GenerationId};
use std::time::Duration;
use thiserror::Error;

/// A single failed agent attempt. Every variant is eligible for retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unusable output: {0}")]
    Unusable(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Agent not configured: {0}")]
    NotConfigured(String),
}

/// Retries for one agent call were consumed without a success.
#[derive(Debug, Clone, Error)]
#[error("{operation} failed after {attempts} attempts: {last_error}")]
pub struct AgentExhaustedError {
    pub operation: String,
    pub attempts: u32,
    #[source]
    pub last_error: AgentError,
}

/// Outcome of a retried operation that did not succeed.
#[derive(Debug, Clone, Error)]
pub enum RetryError {
    #[error(transparent)]
    Exhausted(#[from] AgentExhaustedError),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Pipeline-level failures. Each maps onto a terminal state or a recorded error.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("{stage} generation failed: {source}")]
    AgentExhausted {
        stage: AgentKind,
        #[source]
        source: AgentExhaustedError,
    },

    #[error("Quality validation error: {0}")]
    Validation(String),

    #[error("Final assembly error: {0}")]
    Assembly(String),

    #[error("Generation was cancelled")]
    Cancelled,

    #[error("Generation timed out after {0:?}")]
    TimeoutExceeded(Duration),

    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("{0} output was already written for this generation")]
    OutputAlreadyWritten(AgentKind),
}

/// The quality scorer could not produce a report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ScoringError(pub String);

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Generation not found: {0}")]
    NotFound(GenerationId),

    #[error("Generation already exists: {0}")]
    AlreadyExists(GenerationId),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage data error: {0}")]
    DataError(String),
}

/// Errors surfaced to callers of the generation service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Generation not found: {0}")]
    NotFound(GenerationId),

    #[error("Generation {id} not completed yet (status: {status})")]
    NotCompleted { id: GenerationId, status: String },

    #[error("Generation failed: {}", errors.join("; "))]
    GenerationFailed { errors: Vec<String> },

    #[error("Generation was cancelled: {0}")]
    Cancelled(GenerationId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
