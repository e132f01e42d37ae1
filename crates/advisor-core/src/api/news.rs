//! News client for recent company headlines

use crate::error::{AdvisorError, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://newsapi.org/v2/everything";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Source of recent headlines for a free-text query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeadlineProvider: Send + Sync {
    /// Most recent headline titles, newest first, at most `limit`
    async fn fetch_headlines(
        &self,
        query: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<String>>;
}

/// newsapi.org client
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl NewsApiClient {
    /// Create a new news client with rate limiting
    ///
    /// # Arguments
    /// * `api_key` - newsapi.org API key
    /// * `rate_limit` - Requests per minute
    /// * `timeout` - HTTP request timeout
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(
            NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::new(60).unwrap_or(NonZeroU32::MAX)),
        );
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AdvisorError::NetworkError)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter,
        })
    }
}

#[async_trait]
impl HeadlineProvider for NewsApiClient {
    async fn fetch_headlines(
        &self,
        query: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        self.rate_limiter.until_ready().await;

        debug!(query, language, limit, "Fetching headlines");

        let page_size = limit.to_string();
        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("q", query),
                ("language", language),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AdvisorError::NewsError(format!("News request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::NewsError(format!(
                "News API error {status}: {body}"
            )));
        }

        let envelope: NewsEnvelope = response
            .json()
            .await
            .map_err(|e| AdvisorError::NewsError(format!("Malformed news response: {e}")))?;

        let mut headlines: Vec<String> = envelope
            .articles
            .unwrap_or_default()
            .into_iter()
            .filter_map(|article| article.title)
            .collect();
        headlines.truncate(limit);

        Ok(headlines)
    }
}

#[derive(Debug, Deserialize)]
struct NewsEnvelope {
    #[serde(default)]
    articles: Option<Vec<Article>>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
}
