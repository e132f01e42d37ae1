//! Analysis engine: one linear pass per request

use crate::api::market::{MarketDataProvider, YahooMarketClient};
use crate::api::news::{HeadlineProvider, NewsApiClient};
use crate::api::tickers::{ListingClient, TickerListProvider};
use crate::clock::{Clock, SystemClock};
use crate::config::{AdvisorConfig, Secrets};
use crate::error::{AdvisorError, Result};
use crate::indicators::TechnicalSummary;
use crate::prompt::{SYSTEM_PROMPT, render_prompt};
use crate::sentiment::{NewsDigest, SentimentAnalyzer, VaderAnalyzer};
use crate::universe::{SymbolStatus, UniverseCache};
use advisor_llm::{ChatProvider, CompletionRequest, Message, TogetherConfig, TogetherProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one analysis request
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Full analysis for a listed symbol
    Report(AnalysisReport),
    /// The symbol is not listed; analysis was not attempted
    NotListed {
        symbol: String,
        /// Closest listed symbol, when one clears the threshold
        suggestion: Option<String>,
    },
}

/// Everything the UI renders for a completed analysis
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub symbol: String,
    /// The exact prompt sent to the completion endpoint
    pub prompt: String,
    /// Free-text recommendation from the model
    pub recommendation: String,
    pub technical: TechnicalSummary,
    pub digest: NewsDigest,
}

/// Orchestrates the fetch → compute → prompt → complete pipeline
pub struct AdvisorEngine {
    config: AdvisorConfig,
    market: Arc<dyn MarketDataProvider>,
    listing: Arc<dyn TickerListProvider>,
    news: Arc<dyn HeadlineProvider>,
    sentiment: Arc<dyn SentimentAnalyzer>,
    chat: Arc<dyn ChatProvider>,
    universe: UniverseCache,
}

impl AdvisorEngine {
    /// Wire the engine with the real provider clients
    pub fn new(config: AdvisorConfig, secrets: &Secrets) -> Result<Self> {
        config.validate()?;
        let timeout = config.request_timeout;

        let market = Arc::new(YahooMarketClient::new(timeout)?);
        let listing = Arc::new(ListingClient::new(
            secrets.listing_api_key.clone(),
            5,
            timeout,
        )?);
        let news = Arc::new(NewsApiClient::new(secrets.news_api_key.clone(), 60, timeout)?);
        let sentiment = Arc::new(VaderAnalyzer::new());
        let chat = Arc::new(TogetherProvider::with_config(
            TogetherConfig::new(secrets.chat_api_key.clone())
                .with_api_base(config.chat_api_base.clone())
                .with_timeout(timeout.as_secs()),
        )?);

        Ok(Self::with_providers(
            config,
            market,
            listing,
            news,
            sentiment,
            chat,
            Arc::new(SystemClock),
        ))
    }

    /// Wire the engine with injected collaborators (tests, alternates)
    #[allow(clippy::too_many_arguments)]
    pub fn with_providers(
        config: AdvisorConfig,
        market: Arc<dyn MarketDataProvider>,
        listing: Arc<dyn TickerListProvider>,
        news: Arc<dyn HeadlineProvider>,
        sentiment: Arc<dyn SentimentAnalyzer>,
        chat: Arc<dyn ChatProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let universe = UniverseCache::new(config.universe_ttl, clock);
        Self {
            config,
            market,
            listing,
            news,
            sentiment,
            chat,
            universe,
        }
    }

    /// Run one analysis for a raw user-supplied ticker
    ///
    /// Validation happens before any per-symbol fetch: an unlisted symbol
    /// returns `Outcome::NotListed` without touching the market, news, or
    /// completion providers.
    pub async fn run(&self, raw_input: &str) -> Result<Outcome> {
        let symbol = raw_input.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AdvisorError::InvalidSymbol(
                "ticker symbol is empty".to_string(),
            ));
        }

        let universe = self.universe.get_or_refresh(self.listing.as_ref()).await?;

        match universe.check(&symbol) {
            SymbolStatus::Valid => {}
            SymbolStatus::Suggested(suggestion) => {
                return Ok(Outcome::NotListed {
                    symbol,
                    suggestion: Some(suggestion),
                });
            }
            SymbolStatus::NotFound => {
                return Ok(Outcome::NotListed {
                    symbol,
                    suggestion: None,
                });
            }
        }

        let report = self.analyze(&symbol).await?;
        Ok(Outcome::Report(report))
    }

    async fn analyze(&self, symbol: &str) -> Result<AnalysisReport> {
        info!(symbol, "Fetching market data");
        let snapshot = self
            .market
            .fetch_snapshot(symbol, self.config.lookback_days)
            .await?;

        let technical = TechnicalSummary::from_bars(
            &snapshot.bars,
            self.config.sma_period,
            self.config.rsi_period,
        )?;

        let query = snapshot
            .name
            .clone()
            .unwrap_or_else(|| symbol.to_string());
        let headlines = self
            .news
            .fetch_headlines(&query, &self.config.news_language, self.config.max_headlines)
            .await?;
        let digest = NewsDigest::build(headlines, self.sentiment.as_ref());

        let prompt = render_prompt(&snapshot, &technical, &digest, &self.config)?;
        debug!(symbol, "Prompt assembled");

        let request = CompletionRequest::builder(self.config.model.clone())
            .system(SYSTEM_PROMPT)
            .add_message(Message::user(prompt.clone()))
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .build();

        let response = self.chat.complete(request).await?;
        info!(symbol, "Recommendation received");

        Ok(AnalysisReport {
            symbol: symbol.to_string(),
            prompt,
            recommendation: response.text().to_string(),
            technical,
            digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::market::MockMarketDataProvider;
    use crate::api::news::MockHeadlineProvider;
    use crate::api::tickers::MockTickerListProvider;
    use crate::snapshot::{Fundamentals, MarketSnapshot, OhlcvBar};
    use advisor_llm::{CompletionError, CompletionResponse, StopReason, TokenUsage};
    use async_trait::async_trait;
    use chrono::Utc;

    struct FixedSentiment(f64);

    impl SentimentAnalyzer for FixedSentiment {
        fn polarity(&self, _text: &str) -> f64 {
            self.0
        }
    }

    struct FixedChat(String);

    #[async_trait]
    impl ChatProvider for FixedChat {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> advisor_llm::Result<CompletionResponse> {
            Ok(CompletionResponse {
                message: Message::assistant(self.0.clone()),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 0,
                    output_tokens: 0,
                },
            })
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatProvider for FailingChat {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> advisor_llm::Result<CompletionResponse> {
            Err(CompletionError::RequestFailed(
                "HTTP 500 Internal Server Error: provider exploded".to_string(),
            ))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn sample_snapshot() -> MarketSnapshot {
        let bars = (0..30)
            .map(|i| {
                let close = 150.0 + f64::from(i) * 0.1;
                OhlcvBar {
                    timestamp: Utc::now(),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000_000,
                }
            })
            .collect();

        MarketSnapshot {
            symbol: "AAPL".to_string(),
            name: Some("Apple Inc.".to_string()),
            fundamentals: Fundamentals {
                pe_ratio: Some(28.5),
                market_cap: Some(2_700_000_000_000.0),
            },
            bars,
        }
    }

    fn listing_mock() -> MockTickerListProvider {
        let mut listing = MockTickerListProvider::new();
        listing.expect_fetch_listing().returning(|| {
            Ok(vec![
                "AAPL".to_string(),
                "AAPL1".to_string(),
                "MSFT".to_string(),
            ])
        });
        listing
    }

    fn engine_with_chat(chat: Arc<dyn ChatProvider>) -> AdvisorEngine {
        let mut market = MockMarketDataProvider::new();
        market
            .expect_fetch_snapshot()
            .returning(|_, _| Ok(sample_snapshot()));

        let mut news = MockHeadlineProvider::new();
        news.expect_fetch_headlines().returning(|_, _, _| {
            Ok(vec![
                "Apple beats earnings".to_string(),
                "Apple stock rises".to_string(),
            ])
        });

        AdvisorEngine::with_providers(
            AdvisorConfig::default(),
            Arc::new(market),
            Arc::new(listing_mock()),
            Arc::new(news),
            Arc::new(FixedSentiment(0.5)),
            chat,
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn test_end_to_end_analysis() {
        let engine = engine_with_chat(Arc::new(FixedChat("Recommendation: Buy.".to_string())));

        let outcome = engine.run("aapl").await.unwrap();
        let Outcome::Report(report) = outcome else {
            panic!("expected a report");
        };

        assert_eq!(report.symbol, "AAPL");
        assert_eq!(report.recommendation, "Recommendation: Buy.");

        // Injected values must appear verbatim in the rendered prompt
        assert!(report.prompt.contains("Ticker: AAPL"));
        assert!(report.prompt.contains("P/E Ratio: 28.5"));
        assert!(report.prompt.contains("Market Cap: 2700000000000"));
        assert!(report.prompt.contains("- Apple beats earnings"));
        assert!(report.prompt.contains("- Apple stock rises"));
        assert!(report.prompt.contains("(positive, score 0.50)"));
    }

    #[tokio::test]
    async fn test_unlisted_symbol_suggests_without_fetching() {
        let mut market = MockMarketDataProvider::new();
        market.expect_fetch_snapshot().never();

        let mut news = MockHeadlineProvider::new();
        news.expect_fetch_headlines().never();

        let engine = AdvisorEngine::with_providers(
            AdvisorConfig::default(),
            Arc::new(market),
            Arc::new(listing_mock()),
            Arc::new(news),
            Arc::new(FixedSentiment(0.0)),
            Arc::new(FixedChat(String::new())),
            Arc::new(SystemClock),
        );

        let outcome = engine.run("APPL").await.unwrap();
        let Outcome::NotListed { symbol, suggestion } = outcome else {
            panic!("expected not-listed");
        };

        assert_eq!(symbol, "APPL");
        assert_eq!(suggestion.as_deref(), Some("AAPL"));
    }

    #[tokio::test]
    async fn test_unlisted_symbol_without_suggestion() {
        let engine = engine_with_chat(Arc::new(FixedChat(String::new())));

        let outcome = engine.run("ZZZZZZ").await.unwrap();
        let Outcome::NotListed { suggestion, .. } = outcome else {
            panic!("expected not-listed");
        };
        assert!(suggestion.is_none());
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_before_any_fetch() {
        let mut listing = MockTickerListProvider::new();
        listing.expect_fetch_listing().never();
        let mut market = MockMarketDataProvider::new();
        market.expect_fetch_snapshot().never();
        let mut news = MockHeadlineProvider::new();
        news.expect_fetch_headlines().never();

        let engine = AdvisorEngine::with_providers(
            AdvisorConfig::default(),
            Arc::new(market),
            Arc::new(listing),
            Arc::new(news),
            Arc::new(FixedSentiment(0.0)),
            Arc::new(FixedChat(String::new())),
            Arc::new(SystemClock),
        );

        let err = engine.run("   ").await.unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidSymbol(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_as_error() {
        let engine = engine_with_chat(Arc::new(FailingChat));

        let err = engine.run("AAPL").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
