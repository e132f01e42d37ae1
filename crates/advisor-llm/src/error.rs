//! Error types for chat-completion operations

use thiserror::Error;

/// Result type for chat-completion operations
pub type Result<T> = std::result::Result<T, CompletionError>;

/// Errors that can occur while obtaining a completion
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Provider returned a non-success status
    #[error("Completion request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Network-level failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}
