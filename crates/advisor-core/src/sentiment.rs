//! Headline sentiment scoring and aggregation

use serde::{Deserialize, Serialize};

/// Aggregate score above which the digest is labeled positive
pub const POSITIVE_THRESHOLD: f64 = 0.1;
/// Aggregate score below which the digest is labeled negative
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

/// Per-text polarity scorer, -1.0 (negative) to +1.0 (positive)
pub trait SentimentAnalyzer: Send + Sync {
    /// Signed polarity of one text
    fn polarity(&self, text: &str) -> f64;
}

/// Lexicon-based analyzer backed by VADER
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderAnalyzer;

impl VaderAnalyzer {
    /// Create an analyzer with the bundled lexicon
    pub fn new() -> Self {
        Self
    }
}

impl SentimentAnalyzer for VaderAnalyzer {
    fn polarity(&self, text: &str) -> f64 {
        let analyzer = vader_sentiment::SentimentIntensityAnalyzer::new();
        analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

/// Digest label derived from the aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Label for an aggregate score; the thresholds are strict, so scores
    /// of exactly +/-0.1 are neutral
    pub fn from_score(score: f64) -> Self {
        if score > POSITIVE_THRESHOLD {
            Self::Positive
        } else if score < NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// Lowercase display name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

/// Up to five recent headlines with their aggregate sentiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsDigest {
    /// Headlines in fetch order
    pub headlines: Vec<String>,
    /// Mean per-headline polarity; 0.0 when there are no headlines
    pub score: f64,
    /// Label derived from the score
    pub label: SentimentLabel,
}

impl NewsDigest {
    /// Score each headline with the analyzer and aggregate
    pub fn build(headlines: Vec<String>, analyzer: &dyn SentimentAnalyzer) -> Self {
        let scores: Vec<f64> = headlines
            .iter()
            .map(|headline| analyzer.polarity(headline))
            .collect();
        Self::from_scores(headlines, &scores)
    }

    /// Aggregate pre-computed per-headline scores
    pub fn from_scores(headlines: Vec<String>, scores: &[f64]) -> Self {
        let score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        Self {
            headlines,
            score,
            label: SentimentLabel::from_score(score),
        }
    }

    /// Digest with no headlines: score 0.0, neutral
    pub fn empty() -> Self {
        Self::from_scores(Vec::new(), &[])
    }
}
