//! Error types for advisor operations

use thiserror::Error;

/// Advisor-specific errors
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Rate limit exceeded for a provider
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Market data provider error
    #[error("Market data error: {0}")]
    MarketDataError(String),

    /// Ticker listing provider error
    #[error("Ticker listing error: {0}")]
    ListingError(String),

    /// News provider error
    #[error("News error: {0}")]
    NewsError(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Prompt template rendering error
    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    /// Chat-completion error
    #[error("Completion error: {0}")]
    CompletionError(#[from] advisor_llm::CompletionError),

    /// Secret store error
    #[error("Secret store error: {0}")]
    SecretError(#[from] advisor_utils::SecretError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;
