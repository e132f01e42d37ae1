//! Ticker-listing client for the universe of tradable symbols

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

const BASE_URL: &str = "https://www.alphavantage.co/query";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Source of the full set of currently listed symbols
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TickerListProvider: Send + Sync {
    /// Download the current listing
    async fn fetch_listing(&self) -> Result<Vec<String>>;
}

/// Alpha Vantage LISTING_STATUS client
///
/// The endpoint returns a CSV of every listed security; the caller caches
/// the parsed universe for 24 hours.
pub struct ListingClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl ListingClient {
    /// Create a new listing client with rate limiting
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Requests per minute (free tier: 5)
    /// * `timeout` - HTTP request timeout
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(
            NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::new(5).unwrap_or(NonZeroU32::MAX)),
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
impl TickerListProvider for ListingClient {
    async fn fetch_listing(&self) -> Result<Vec<String>> {
        self.rate_limiter.until_ready().await;

        debug!("Downloading ticker listing");

        let response = self
            .client
            .get(BASE_URL)
            .query(&[("function", "LISTING_STATUS"), ("apikey", &self.api_key)])
            .send()
            .await
            .map_err(|e| AdvisorError::ListingError(format!("Listing request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::ListingError(format!(
                "Listing API error {status}: {body}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdvisorError::ListingError(format!("Failed to read listing body: {e}")))?;

        parse_listing(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    symbol: String,
    #[serde(default)]
    status: Option<String>,
}

/// Parse the LISTING_STATUS CSV into active symbols
///
/// A throttled key gets a JSON "Note" body instead of CSV; that surfaces as
/// a rate-limit error rather than an empty universe.
fn parse_listing(body: &str) -> Result<Vec<String>> {
    if body.trim_start().starts_with('{') {
        if body.contains("Note") {
            return Err(AdvisorError::RateLimitExceeded {
                provider: "Alpha Vantage".to_string(),
            });
        }
        return Err(AdvisorError::ListingError(
            "Listing endpoint returned JSON instead of CSV".to_string(),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut symbols = Vec::new();
    for row in reader.deserialize::<ListingRow>() {
        let row = row.map_err(|e| AdvisorError::ListingError(format!("Malformed CSV row: {e}")))?;
        if row.status.as_deref().is_none_or(|status| status == "Active") {
            symbols.push(row.symbol);
        }
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
symbol,name,exchange,assetType,ipoDate,delistingDate,status
AAPL,Apple Inc,NASDAQ,Stock,1980-12-12,null,Active
MSFT,Microsoft Corporation,NASDAQ,Stock,1986-03-13,null,Active
YHOO,Yahoo! Inc,NASDAQ,Stock,1996-04-12,2017-06-16,Delisted
";

    #[test]
    fn test_parse_listing_keeps_active_rows() {
        let symbols = parse_listing(SAMPLE_CSV).unwrap();
        assert_eq!(symbols, vec!["AAPL".to_string(), "MSFT".to_string()]);
    }

    #[test]
    fn test_parse_listing_rate_limit_note() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#;
        let err = parse_listing(body).unwrap_err();
        assert!(matches!(err, AdvisorError::RateLimitExceeded { .. }));
    }

    #[test]
    fn test_parse_listing_unexpected_json() {
        let body = r#"{"Error Message": "the parameter apikey is invalid"}"#;
        let err = parse_listing(body).unwrap_err();
        assert!(matches!(err, AdvisorError::ListingError(_)));
    }

    #[test]
    fn test_client_creation() {
        let client = ListingClient::new("test_key", 5, Duration::from_secs(30)).unwrap();
        assert_eq!(client.api_key, "test_key");
    }
}
