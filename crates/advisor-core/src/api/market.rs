//! Market data client: fundamentals and price history

use crate::error::{AdvisorError, Result};
use crate::snapshot::{Fundamentals, MarketSnapshot, OhlcvBar};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Source of fundamentals and OHLCV history for one ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch fundamentals plus a `lookback_days` price series
    async fn fetch_snapshot(&self, symbol: &str, lookback_days: i64) -> Result<MarketSnapshot>;
}

/// Yahoo Finance market data client
pub struct YahooMarketClient {
    http: Client,
}

impl YahooMarketClient {
    /// Create a client with an explicit request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AdvisorError::NetworkError)?;
        Ok(Self { http })
    }

    /// Historical daily bars over the lookback window
    async fn fetch_history(&self, symbol: &str, lookback_days: i64) -> Result<Vec<OhlcvBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| AdvisorError::MarketDataError(e.to_string()))?;

        let end = Utc::now();
        let start = end - chrono::Duration::days(lookback_days);

        // Bridge chrono timestamps into the time crate the connector expects
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| AdvisorError::MarketDataError(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| AdvisorError::MarketDataError(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| AdvisorError::MarketDataError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| AdvisorError::MarketDataError(e.to_string()))?;

        Ok(quotes
            .iter()
            .map(|quote| OhlcvBar {
                timestamp: DateTime::from_timestamp(quote.timestamp as i64, 0)
                    .unwrap_or_else(Utc::now),
                open: quote.open,
                high: quote.high,
                low: quote.low,
                close: quote.close,
                volume: quote.volume,
            })
            .collect())
    }

    /// Company name and optional fundamentals from the quote endpoint
    async fn fetch_quote_fields(&self, symbol: &str) -> Result<(Option<String>, Fundamentals)> {
        let response = self
            .http
            .get(QUOTE_URL)
            .query(&[("symbols", symbol)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdvisorError::MarketDataError(format!(
                "Quote endpoint returned HTTP {}",
                response.status()
            )));
        }

        let envelope: QuoteEnvelope = response
            .json()
            .await
            .map_err(|e| AdvisorError::MarketDataError(format!("Malformed quote response: {e}")))?;

        let result = envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| AdvisorError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no quote data returned".to_string(),
            })?;

        Ok((
            result.long_name,
            Fundamentals {
                pe_ratio: result.trailing_pe,
                market_cap: result.market_cap,
            },
        ))
    }
}

#[async_trait]
impl MarketDataProvider for YahooMarketClient {
    async fn fetch_snapshot(&self, symbol: &str, lookback_days: i64) -> Result<MarketSnapshot> {
        debug!(symbol, lookback_days, "Fetching market snapshot");

        let bars = self.fetch_history(symbol, lookback_days).await?;
        let (name, fundamentals) = self.fetch_quote_fields(symbol).await?;

        Ok(MarketSnapshot {
            symbol: symbol.to_string(),
            name,
            fundamentals,
            bars,
        })
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    long_name: Option<String>,
    trailing_pe: Option<f64>,
    market_cap: Option<f64>,
}
