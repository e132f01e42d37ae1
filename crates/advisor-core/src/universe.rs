//! Ticker universe: membership, typo suggestions, and the 24-hour cache
//!
//! The universe is the set of currently listed symbols. Symbols are stored
//! in a `BTreeSet` so iteration order is lexicographic, which makes the
//! suggestion tie-break reproducible across cache rebuilds.

use crate::api::tickers::TickerListProvider;
use crate::clock::Clock;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Minimum similarity ratio for a suggestion to be offered
pub const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Outcome of validating a candidate symbol against the universe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolStatus {
    /// The symbol is listed
    Valid,
    /// Not listed, but a close match exists
    Suggested(String),
    /// Not listed and nothing similar enough to suggest
    NotFound,
}

/// The set of valid symbols
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerUniverse {
    symbols: BTreeSet<String>,
}

impl TickerUniverse {
    /// Build a universe from raw listing symbols
    ///
    /// Symbols are trimmed and uppercased; empties are dropped.
    pub fn new(symbols: impl IntoIterator<Item = String>) -> Self {
        let symbols = symbols
            .into_iter()
            .map(|symbol| symbol.trim().to_uppercase())
            .filter(|symbol| !symbol.is_empty())
            .collect();
        Self { symbols }
    }

    /// Number of listed symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the universe is empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Membership test for an already-uppercased candidate
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    /// Validate a candidate, falling back to the closest-match suggestion
    ///
    /// Membership short-circuits: the suggester only runs for non-members.
    pub fn check(&self, symbol: &str) -> SymbolStatus {
        if self.contains(symbol) {
            return SymbolStatus::Valid;
        }

        match self.suggest_closest(symbol) {
            Some(suggestion) => SymbolStatus::Suggested(suggestion),
            None => SymbolStatus::NotFound,
        }
    }

    /// Propose the single best alternative for a candidate that is not a
    /// member, or `None` when nothing clears the acceptability threshold
    ///
    /// Deterministic: the highest-scoring symbol wins and ties resolve to
    /// the lexicographically smallest member (strict `>` over the sorted
    /// set keeps the first-encountered maximum).
    pub fn suggest_closest(&self, candidate: &str) -> Option<String> {
        let mut best: Option<(&str, f64)> = None;

        for symbol in &self.symbols {
            let score = similarity_ratio(candidate, symbol);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((symbol, score));
            }
        }

        best.filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .map(|(symbol, _)| symbol.to_string())
    }
}

/// Similarity of two symbols as `2*M / (len_a + len_b)`, where `M` is the
/// total length of matching blocks after longest-common-block alignment
///
/// Both inputs identical gives 1.0; no characters in common gives 0.0.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    2.0 * matching_len(a, b) as f64 / (a.len() + b.len()) as f64
}

/// Total length of matching blocks: take the longest common contiguous
/// block, then recurse on the pieces to its left and right
fn matching_len(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (start_a, start_b, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }

    len + matching_len(&a[..start_a], &b[..start_b])
        + matching_len(&a[start_a + len..], &b[start_b + len..])
}

/// Longest common contiguous block of `a` and `b`
///
/// Returns `(start_a, start_b, len)`; on equal lengths the block starting
/// earliest in `a` wins.
fn longest_common_block(a: &[u8], b: &[u8]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        let mut curr = vec![0usize; b.len() + 1];
        for (j, &cb) in b.iter().enumerate() {
            if ca == cb {
                let len = prev[j] + 1;
                curr[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        prev = curr;
    }

    best
}

struct CachedUniverse {
    fetched_at: DateTime<Utc>,
    universe: Arc<TickerUniverse>,
}

/// Time-bounded holder for the ticker universe
///
/// The universe is rebuilt at most once per TTL and replaced wholesale, so
/// a concurrent refresh costs a redundant fetch but can never corrupt the
/// cached value. The clock is injected so tests control expiry.
pub struct UniverseCache {
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    inner: RwLock<Option<CachedUniverse>>,
}

impl UniverseCache {
    /// Create a cache with the given lifetime and time source
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(24));
        Self {
            ttl,
            clock,
            inner: RwLock::new(None),
        }
    }

    /// Return the cached universe, fetching a fresh listing when the cached
    /// value is absent or older than the TTL
    pub async fn get_or_refresh(
        &self,
        provider: &dyn TickerListProvider,
    ) -> Result<Arc<TickerUniverse>> {
        let now = self.clock.now();

        {
            let guard = self.inner.read().await;
            if let Some(cached) = guard.as_ref() {
                if now.signed_duration_since(cached.fetched_at) < self.ttl {
                    debug!("Universe cache hit");
                    return Ok(Arc::clone(&cached.universe));
                }
            }
        }

        info!("Refreshing ticker universe");
        let symbols = provider.fetch_listing().await?;
        let universe = Arc::new(TickerUniverse::new(symbols));

        let mut guard = self.inner.write().await;
        *guard = Some(CachedUniverse {
            fetched_at: now,
            universe: Arc::clone(&universe),
        });

        Ok(universe)
    }

    /// Drop the cached universe so the next lookup refetches
    pub async fn invalidate(&self) {
        let mut guard = self.inner.write().await;
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn universe(symbols: &[&str]) -> TickerUniverse {
        TickerUniverse::new(symbols.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn test_membership_short_circuits_suggestion() {
        let universe = universe(&["AAPL", "MSFT"]);
        assert!(universe.contains("AAPL"));
        assert_eq!(universe.check("AAPL"), SymbolStatus::Valid);
    }

    #[test]
    fn test_normalization() {
        let universe = TickerUniverse::new(vec![" aapl ".to_string(), String::new()]);
        assert_eq!(universe.len(), 1);
        assert!(universe.contains("AAPL"));
    }

    #[test]
    fn test_typo_suggests_closest_symbol() {
        let universe = universe(&["AAPL", "AAPL1", "MSFT"]);
        assert_eq!(
            universe.check("APPL"),
            SymbolStatus::Suggested("AAPL".to_string())
        );
    }

    #[test]
    fn test_empty_universe_never_suggests() {
        let universe = TickerUniverse::default();
        assert!(universe.suggest_closest("AAPL").is_none());
        assert_eq!(universe.check("AAPL"), SymbolStatus::NotFound);
    }

    #[test]
    fn test_nothing_close_enough() {
        let universe = universe(&["MSFT", "GOOG"]);
        assert_eq!(universe.check("ZZZZZZ"), SymbolStatus::NotFound);
    }

    #[test]
    fn test_tie_breaks_lexicographically() {
        // Both members score identically against the candidate; the
        // lexicographically smaller one must win regardless of insert order.
        let universe = universe(&["ABCY", "ABCX"]);
        assert_eq!(
            universe.suggest_closest("ABCZ").as_deref(),
            Some("ABCX")
        );
    }

    #[test]
    fn test_similarity_ratio_bounds() {
        assert!((similarity_ratio("AAPL", "AAPL") - 1.0).abs() < f64::EPSILON);
        assert!((similarity_ratio("AAPL", "XQZW")).abs() < f64::EPSILON);
        assert!((similarity_ratio("", "") - 1.0).abs() < f64::EPSILON);
        assert!((similarity_ratio("AAPL", "")).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_ratio_transposition() {
        // "APPL" vs "AAPL": blocks "AP" + "L" (or "A" + "PL"), M = 3
        let score = similarity_ratio("APPL", "AAPL");
        assert!((score - 0.75).abs() < 1e-9);
    }

    struct CountingProvider {
        listing: Vec<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TickerListProvider for CountingProvider {
        async fn fetch_listing(&self) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.listing.clone())
        }
    }

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(now)))
        }

        fn advance(&self, delta: chrono::Duration) {
            let mut guard = self.0.lock().unwrap();
            *guard += delta;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn test_cache_reuses_within_ttl_and_refreshes_after() {
        let clock = ManualClock::starting_at(Utc::now());
        let clock_arc: Arc<dyn Clock> = clock.clone();
        let cache = UniverseCache::new(Duration::from_secs(24 * 3600), clock_arc);
        let provider = CountingProvider {
            listing: vec!["AAPL".to_string(), "MSFT".to_string()],
            calls: AtomicUsize::new(0),
        };

        let first = cache.get_or_refresh(&provider).await.unwrap();
        assert!(first.contains("AAPL"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // 23 hours later: still fresh, no second fetch
        clock.advance(chrono::Duration::hours(23));
        let second = cache.get_or_refresh(&provider).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*first, *second);

        // 25 hours after the first fetch: stale, refetches
        clock.advance(chrono::Duration::hours(2));
        cache.get_or_refresh(&provider).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_invalidate_forces_refetch() {
        let clock: Arc<dyn Clock> = ManualClock::starting_at(Utc::now());
        let cache = UniverseCache::new(Duration::from_secs(24 * 3600), clock);
        let provider = CountingProvider {
            listing: vec!["AAPL".to_string()],
            calls: AtomicUsize::new(0),
        };

        cache.get_or_refresh(&provider).await.unwrap();
        cache.invalidate().await;
        cache.get_or_refresh(&provider).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
