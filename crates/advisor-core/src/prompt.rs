//! Recommendation prompt assembly
//!
//! The prompt is a fixed template rendered with pre-formatted values, so
//! the same inputs always produce the same text. Absent values render as
//! the `N/A` placeholder rather than being dropped.

use crate::config::AdvisorConfig;
use crate::error::Result;
use crate::indicators::TechnicalSummary;
use crate::sentiment::NewsDigest;
use crate::snapshot::MarketSnapshot;
use minijinja::{Environment, context};

/// Placeholder for values the providers did not supply
pub const PLACEHOLDER: &str = "N/A";

/// System message sent with every recommendation request
pub const SYSTEM_PROMPT: &str = "You are a helpful financial analyst.";

const RECOMMENDATION_TEMPLATE: &str = r"Analyze this stock and say if it is a good buy, hold, or sell:
Ticker: {{ symbol }}
Company: {{ company }}
P/E Ratio: {{ pe_ratio }}
Market Cap: {{ market_cap }}
{{ sma_period }}-day SMA: {{ sma }}
{{ rsi_period }}-day RSI: {{ rsi }}
Annualized Volatility: {{ volatility }}
Recent News ({{ sentiment_label }}, score {{ sentiment_score }}):
{%- if headlines %}
{%- for headline in headlines %}
- {{ headline }}
{%- endfor %}
{%- else %}
- No recent headlines found.
{%- endif %}

Return your recommendation and explain why.";

/// Render the recommendation prompt for one analysis
pub fn render_prompt(
    snapshot: &MarketSnapshot,
    technical: &TechnicalSummary,
    digest: &NewsDigest,
    config: &AdvisorConfig,
) -> Result<String> {
    let env = Environment::new();
    let template = env.template_from_str(RECOMMENDATION_TEMPLATE)?;

    let rendered = template.render(context! {
        symbol => snapshot.symbol.clone(),
        company => snapshot.name.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
        pe_ratio => fmt_scalar(snapshot.fundamentals.pe_ratio),
        market_cap => fmt_market_cap(snapshot.fundamentals.market_cap),
        sma_period => config.sma_period,
        sma => fmt_scalar(technical.sma),
        rsi_period => config.rsi_period,
        rsi => fmt_scalar(technical.rsi),
        volatility => fmt_volatility(technical.realized_volatility),
        sentiment_label => digest.label.as_str(),
        sentiment_score => format!("{:.2}", digest.score),
        headlines => digest.headlines.clone(),
    })?;

    Ok(rendered)
}

fn fmt_scalar(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |value| format!("{value:.2}"))
}

fn fmt_market_cap(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |value| format!("{value:.0}"))
}

fn fmt_volatility(value: Option<f64>) -> String {
    value.map_or_else(
        || PLACEHOLDER.to_string(),
        |value| format!("{:.1}%", value * 100.0),
    )
}
