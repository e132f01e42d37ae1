//! Technical indicators derived from a snapshot's price series

use crate::error::{AdvisorError, Result};
use crate::snapshot::OhlcvBar;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::{RelativeStrengthIndex, SimpleMovingAverage, StandardDeviation};

/// Trading days per year, used to annualize daily volatility
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Derived scalar indicators for one snapshot
///
/// Any field is `None` when the series is too short to support it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalSummary {
    /// Latest simple moving average of closing prices
    pub sma: Option<f64>,
    /// Latest relative strength index reading
    pub rsi: Option<f64>,
    /// Annualized realized volatility of daily log returns, as a fraction
    pub realized_volatility: Option<f64>,
}

impl TechnicalSummary {
    /// Compute the summary from a time-ordered bar series
    pub fn from_bars(bars: &[OhlcvBar], sma_period: usize, rsi_period: usize) -> Result<Self> {
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();

        Ok(Self {
            sma: latest_sma(&closes, sma_period)?,
            rsi: latest_rsi(&closes, rsi_period)?,
            realized_volatility: realized_volatility(&closes)?,
        })
    }
}

/// Latest SMA over the closing prices, `None` when fewer than `period` bars
fn latest_sma(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() < period {
        return Ok(None);
    }

    let mut sma = SimpleMovingAverage::new(period)
        .map_err(|e| AdvisorError::IndicatorError(e.to_string()))?;

    let mut latest = None;
    for &close in closes {
        latest = Some(sma.next(close));
    }

    Ok(latest)
}

/// Latest RSI reading, `None` when the series has fewer than `period`
/// price changes
fn latest_rsi(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() < period + 1 {
        return Ok(None);
    }

    let mut rsi = RelativeStrengthIndex::new(period)
        .map_err(|e| AdvisorError::IndicatorError(e.to_string()))?;

    let mut latest = None;
    for &close in closes {
        latest = Some(rsi.next(close));
    }

    Ok(latest)
}

/// Annualized standard deviation of daily log returns
///
/// Needs at least two returns (three bars); fewer yields `None`.
fn realized_volatility(closes: &[f64]) -> Result<Option<f64>> {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|pair| pair[0] > 0.0 && pair[1] > 0.0)
        .map(|pair| (pair[1] / pair[0]).ln())
        .collect();

    if returns.len() < 2 {
        return Ok(None);
    }

    let mut stddev = StandardDeviation::new(returns.len())
        .map_err(|e| AdvisorError::IndicatorError(e.to_string()))?;

    let mut latest = 0.0;
    for &ret in &returns {
        latest = stddev.next(ret);
    }

    Ok(Some(latest * TRADING_DAYS_PER_YEAR.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bars(closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .map(|&close| OhlcvBar {
                timestamp: Utc::now(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn test_flat_series() {
        let bars = bars(&[100.0; 30]);
        let summary = TechnicalSummary::from_bars(&bars, 20, 14).unwrap();

        let sma = summary.sma.unwrap();
        assert!((sma - 100.0).abs() < 1e-9);

        // No price movement: zero realized volatility
        let vol = summary.realized_volatility.unwrap();
        assert!(vol.abs() < 1e-12);
    }

    #[test]
    fn test_monotonic_gains_max_out_rsi() {
        let closes: Vec<f64> = (1..=30).map(|i| 100.0 + f64::from(i)).collect();
        let summary = TechnicalSummary::from_bars(&bars(&closes), 20, 14).unwrap();

        // Only gains, no losses
        assert!(summary.rsi.unwrap() > 99.0);
    }

    #[test]
    fn test_short_series_is_unavailable() {
        let summary = TechnicalSummary::from_bars(&bars(&[100.0, 101.0]), 20, 14).unwrap();
        assert!(summary.sma.is_none());
        assert!(summary.rsi.is_none());
        // Two bars give one return, not enough for a deviation
        assert!(summary.realized_volatility.is_none());
    }

    #[test]
    fn test_empty_series() {
        let summary = TechnicalSummary::from_bars(&[], 20, 14).unwrap();
        assert!(summary.sma.is_none());
        assert!(summary.rsi.is_none());
        assert!(summary.realized_volatility.is_none());
    }

    #[test]
    fn test_sma_uses_trailing_window() {
        // 0..=9 then 20 tens; SMA(10) over the last ten bars is exactly 10
        let mut closes = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        closes.extend(std::iter::repeat_n(10.0, 10));
        let summary = TechnicalSummary::from_bars(&bars(&closes), 10, 14).unwrap();
        assert!((summary.sma.unwrap() - 10.0).abs() < 1e-9);
    }
}
