//! Request-scoped market data entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Valuation metrics, each optionally absent from the provider response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    /// Trailing price-to-earnings ratio
    pub pe_ratio: Option<f64>,
    /// Market capitalization in the listing currency
    pub market_cap: Option<f64>,
}

/// Fundamentals plus price history for one ticker, produced once per
/// analysis and never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    /// Company long name, when the provider supplies one
    pub name: Option<String>,
    pub fundamentals: Fundamentals,
    /// Time-ordered bars over the lookback window; may be empty
    pub bars: Vec<OhlcvBar>,
}

impl MarketSnapshot {
    /// Closing prices in series order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }
}
