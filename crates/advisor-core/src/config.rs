//! Configuration for advisor operations

use crate::error::{AdvisorError, Result};
use advisor_utils::SecretStore;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment key for the chat-completion API key
pub const CHAT_KEY: &str = "TOGETHER_API_KEY";
/// Environment key for the news API key
pub const NEWS_KEY: &str = "NEWS_API_KEY";
/// Environment key for the ticker-listing API key
pub const LISTING_KEY: &str = "ALPHA_VANTAGE_API_KEY";

/// Configuration for advisor operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Model identifier sent to the completion endpoint
    pub model: String,

    /// Base URL of the chat-completion endpoint
    pub chat_api_base: String,

    /// Maximum tokens for the recommendation
    pub max_tokens: usize,

    /// Sampling temperature for the recommendation
    pub temperature: f32,

    /// Price-history lookback window in days
    pub lookback_days: i64,

    /// Language filter for headlines
    pub news_language: String,

    /// Maximum number of headlines in the digest
    pub max_headlines: usize,

    /// Ticker-universe cache lifetime
    pub universe_ttl: Duration,

    /// Request timeout applied to every HTTP client
    pub request_timeout: Duration,

    /// Simple moving average period
    pub sma_period: usize,

    /// Relative strength index period
    pub rsi_period: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: "mistralai/Mixtral-8x7B-Instruct-v0.1".to_string(),
            chat_api_base: "https://api.together.xyz/v1".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            lookback_days: 180, // 6 months
            news_language: "en".to_string(),
            max_headlines: 5,
            universe_ttl: Duration::from_secs(24 * 3600),
            request_timeout: Duration::from_secs(30),
            sma_period: 20,
            rsi_period: 14,
        }
    }
}

impl AdvisorConfig {
    /// Create a new configuration builder
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(AdvisorError::ConfigError("model must not be empty".to_string()));
        }

        if self.max_headlines == 0 {
            return Err(AdvisorError::ConfigError(
                "max_headlines must be greater than 0".to_string(),
            ));
        }

        if self.lookback_days <= 0 {
            return Err(AdvisorError::ConfigError(
                "lookback_days must be greater than 0".to_string(),
            ));
        }

        if self.sma_period == 0 || self.rsi_period == 0 {
            return Err(AdvisorError::ConfigError(
                "indicator periods must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for AdvisorConfig
#[derive(Debug, Default)]
pub struct AdvisorConfigBuilder {
    model: Option<String>,
    chat_api_base: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    lookback_days: Option<i64>,
    news_language: Option<String>,
    max_headlines: Option<usize>,
    universe_ttl: Option<Duration>,
    request_timeout: Option<Duration>,
    sma_period: Option<usize>,
    rsi_period: Option<usize>,
}

impl AdvisorConfigBuilder {
    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the chat-completion endpoint base URL
    pub fn chat_api_base(mut self, base: impl Into<String>) -> Self {
        self.chat_api_base = Some(base.into());
        self
    }

    /// Set the maximum completion tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the price-history lookback window in days
    pub fn lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Set the headline language filter
    pub fn news_language(mut self, language: impl Into<String>) -> Self {
        self.news_language = Some(language.into());
        self
    }

    /// Set the maximum headline count
    pub fn max_headlines(mut self, count: usize) -> Self {
        self.max_headlines = Some(count);
        self
    }

    /// Set the universe cache lifetime
    pub fn universe_ttl(mut self, ttl: Duration) -> Self {
        self.universe_ttl = Some(ttl);
        self
    }

    /// Set the HTTP request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the simple moving average period
    pub fn sma_period(mut self, period: usize) -> Self {
        self.sma_period = Some(period);
        self
    }

    /// Set the relative strength index period
    pub fn rsi_period(mut self, period: usize) -> Self {
        self.rsi_period = Some(period);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AdvisorConfig> {
        let defaults = AdvisorConfig::default();

        let config = AdvisorConfig {
            model: self.model.unwrap_or(defaults.model),
            chat_api_base: self.chat_api_base.unwrap_or(defaults.chat_api_base),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            news_language: self.news_language.unwrap_or(defaults.news_language),
            max_headlines: self.max_headlines.unwrap_or(defaults.max_headlines),
            universe_ttl: self.universe_ttl.unwrap_or(defaults.universe_ttl),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            sma_period: self.sma_period.unwrap_or(defaults.sma_period),
            rsi_period: self.rsi_period.unwrap_or(defaults.rsi_period),
        };

        config.validate()?;
        Ok(config)
    }
}

/// API keys required by the pipeline, resolved from the secret store
#[derive(Debug, Clone)]
pub struct Secrets {
    /// Chat-completion API key
    pub chat_api_key: String,
    /// News API key
    pub news_api_key: String,
    /// Ticker-listing API key
    pub listing_api_key: String,
}

impl Secrets {
    /// Resolve all required keys, naming the first one that is missing
    pub fn resolve(store: &SecretStore) -> Result<Self> {
        let require = |key: &str| {
            store
                .get(key)
                .ok_or_else(|| AdvisorError::ConfigError(format!("secret {key} is not set")))
        };

        Ok(Self {
            chat_api_key: require(CHAT_KEY)?,
            news_api_key: require(NEWS_KEY)?,
            listing_api_key: require(LISTING_KEY)?,
        })
    }
}
