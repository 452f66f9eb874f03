//! The market data aggregator.
//!
//! Orchestrates everything: classification, deduplication, the two-tier
//! cache, and the ordered provider fallback cascade. Built once per
//! process with its collaborators injected and passed by reference to
//! consumers - there is no hidden global instance.
//!
//! The public operations never fail. A quote request for which every
//! provider is down, unresolvable, or returning garbage yields `None`;
//! the matching candle request yields an empty vector. Callers decide how
//! to present "no data".

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::cache::{CacheStore, FsStore, PersistentStore};
use crate::config::AggregatorConfig;
use crate::dedup::Deduplicator;
use crate::errors::RetryClass;
use crate::models::{AssetClass, Candle, Quote};
use crate::provider::alpha_vantage::AlphaVantageProvider;
use crate::provider::coingecko::CoinGeckoProvider;
use crate::provider::finnhub::FinnhubProvider;
use crate::provider::polygon::PolygonProvider;
use crate::provider::MarketDataProvider;
use crate::resolver::{RulesResolver, SymbolResolver};

use super::circuit_breaker::CircuitBreaker;
use super::rate_limiter::RateLimiter;
use super::validator::QuoteValidator;

/// Freshness window for real-time quotes.
pub const DEFAULT_QUOTE_TTL: Duration = Duration::from_secs(1);

/// Freshness window for historical candles - history changes slowly.
pub const DEFAULT_CANDLE_TTL: Duration = Duration::from_secs(300);

/// Which operation a cascade is being assembled for.
#[derive(Clone, Copy)]
enum Operation {
    Quotes,
    Candles,
}

/// Construction-time knobs for the aggregator.
pub struct AggregatorSettings {
    pub quote_ttl: Duration,
    pub candle_ttl: Duration,
    /// Persistent cache backend. `None` runs memory-only, for
    /// environments without durable local storage.
    pub persistent: Option<Arc<dyn PersistentStore>>,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            quote_ttl: DEFAULT_QUOTE_TTL,
            candle_ttl: DEFAULT_CANDLE_TTL,
            persistent: None,
        }
    }
}

struct Inner {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    resolver: Arc<dyn SymbolResolver>,
    quote_cache: CacheStore<Quote>,
    candle_cache: CacheStore<Vec<Candle>>,
    quote_dedup: Deduplicator<Option<Quote>>,
    candle_dedup: Deduplicator<Vec<Candle>>,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
    validator: QuoteValidator,
    quote_ttl: Duration,
    candle_ttl: Duration,
}

/// Unified, resilient market data access across heterogeneous providers.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct MarketDataAggregator {
    inner: Arc<Inner>,
}

impl MarketDataAggregator {
    /// Create an aggregator with default settings (memory-only cache).
    pub fn new(
        providers: Vec<Arc<dyn MarketDataProvider>>,
        resolver: Arc<dyn SymbolResolver>,
    ) -> Self {
        Self::with_settings(providers, resolver, AggregatorSettings::default())
    }

    /// Create an aggregator with custom settings.
    pub fn with_settings(
        providers: Vec<Arc<dyn MarketDataProvider>>,
        resolver: Arc<dyn SymbolResolver>,
        settings: AggregatorSettings,
    ) -> Self {
        let rate_limiter = RateLimiter::new();
        for provider in &providers {
            rate_limiter.configure(provider.id(), provider.rate_limit());
        }

        let (quote_cache, candle_cache) = match settings.persistent {
            Some(store) => (
                CacheStore::with_persistent(Arc::clone(&store)),
                CacheStore::with_persistent(store),
            ),
            None => (CacheStore::memory_only(), CacheStore::memory_only()),
        };

        Self {
            inner: Arc::new(Inner {
                providers,
                resolver,
                quote_cache,
                candle_cache,
                quote_dedup: Deduplicator::new(),
                candle_dedup: Deduplicator::new(),
                rate_limiter,
                circuit_breaker: CircuitBreaker::new(),
                validator: QuoteValidator::new(),
                quote_ttl: settings.quote_ttl,
                candle_ttl: settings.candle_ttl,
            }),
        }
    }

    /// Assemble the standard provider set from configuration.
    ///
    /// Providers with missing credentials register but report themselves
    /// disabled. A cache directory that cannot be created degrades to
    /// memory-only caching with a warning.
    pub fn from_config(config: AggregatorConfig) -> Self {
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![
            Arc::new(FinnhubProvider::new(config.finnhub_api_key)),
            Arc::new(PolygonProvider::new(config.polygon_api_key)),
            Arc::new(AlphaVantageProvider::new(config.alpha_vantage_api_key)),
            Arc::new(CoinGeckoProvider::new()),
        ];

        let persistent = config.cache_dir.and_then(|dir| match FsStore::new(&dir) {
            Ok(store) => Some(Arc::new(store) as Arc<dyn PersistentStore>),
            Err(e) => {
                warn!(
                    "Cache directory {:?} unavailable ({}), caching in memory only",
                    dir, e
                );
                None
            }
        });

        Self::with_settings(
            providers,
            Arc::new(RulesResolver::new()),
            AggregatorSettings {
                quote_ttl: config.quote_ttl,
                candle_ttl: config.candle_ttl,
                persistent,
            },
        )
    }

    /// Get a real-time quote.
    ///
    /// Safe to call with arbitrary symbols. `None` means every provider
    /// in the cascade failed or returned unusable data - upstream
    /// failures are absorbed here, never raised.
    ///
    /// Concurrent calls for the same symbol collapse into one upstream
    /// round trip and all observe the same result.
    pub async fn get_quote(&self, symbol: &str) -> Option<Quote> {
        let key = format!("quote:{}", symbol);

        let fetch = {
            let inner = Arc::clone(&self.inner);
            let symbol = symbol.to_string();
            let key = key.clone();
            async move { inner.fetch_quote(&symbol, &key).await }
        };

        self.inner.quote_dedup.deduplicate(key, fetch).await
    }

    /// Get historical candles for a symbol.
    ///
    /// `from`/`to` are epoch seconds. Returns an ascending, duplicate-free
    /// sequence; empty when no provider could serve the range.
    pub async fn get_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> Vec<Candle> {
        let key = format!("candles:{}:{}:{}:{}", symbol, resolution, from, to);

        let fetch = {
            let inner = Arc::clone(&self.inner);
            let symbol = symbol.to_string();
            let resolution = resolution.to_string();
            let key = key.clone();
            async move {
                inner
                    .fetch_candles(&symbol, &resolution, from, to, &key)
                    .await
            }
        };

        self.inner.candle_dedup.deduplicate(key, fetch).await
    }
}

impl Inner {
    /// Enabled providers that can serve `class`/`op`, in cascade order.
    fn ordered_providers(
        &self,
        class: AssetClass,
        op: Operation,
    ) -> Vec<&Arc<dyn MarketDataProvider>> {
        let mut providers: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.is_enabled())
            .filter(|p| {
                let caps = p.capabilities();
                caps.asset_classes.contains(&class)
                    && match op {
                        Operation::Quotes => caps.supports_quotes,
                        Operation::Candles => caps.supports_candles,
                    }
            })
            .collect();

        providers.sort_by_key(|p| p.priority());
        providers
    }

    async fn fetch_quote(&self, symbol: &str, key: &str) -> Option<Quote> {
        if let Some(hit) = self.quote_cache.get(key, self.quote_ttl) {
            debug!("Quote cache hit for '{}'", symbol);
            return Some(hit);
        }

        let class = AssetClass::of(symbol);
        let mut found = None;

        for provider in self.ordered_providers(class, Operation::Quotes) {
            let pid = provider.id();

            if !self.circuit_breaker.is_allowed(pid) {
                debug!("Circuit open for '{}', skipping", pid);
                continue;
            }

            let Some(provider_symbol) = self.resolver.resolve(pid, symbol, class) else {
                debug!("No '{}' symbol for '{}', trying next provider", pid, symbol);
                continue;
            };

            self.rate_limiter.acquire(pid).await;

            match provider.get_quote(&provider_symbol).await {
                Ok(mut raw) => {
                    self.circuit_breaker.record_success(pid);

                    // Canonical records carry the internal symbol, not the
                    // provider-routed one.
                    raw.symbol = symbol.to_string();

                    if let Some(quote) = self.validator.safe_validate(&raw) {
                        found = Some(quote);
                        break;
                    }
                }
                Err(e) => {
                    if e.retry_class() == RetryClass::FailoverWithPenalty {
                        self.circuit_breaker.record_failure(pid);
                    }
                    warn!("Provider '{}' failed quote for '{}': {}", pid, symbol, e);
                }
            }
        }

        match found {
            Some(quote) => {
                self.quote_cache.set(key, &quote);
                Some(quote)
            }
            None => {
                debug!("All providers exhausted for quote '{}'", symbol);
                None
            }
        }
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
        key: &str,
    ) -> Vec<Candle> {
        if let Some(hit) = self.candle_cache.get(key, self.candle_ttl) {
            debug!("Candle cache hit for '{}'", symbol);
            return hit;
        }

        let class = AssetClass::of(symbol);
        let mut found: Option<Vec<Candle>> = None;

        for provider in self.ordered_providers(class, Operation::Candles) {
            let pid = provider.id();

            if !self.circuit_breaker.is_allowed(pid) {
                debug!("Circuit open for '{}', skipping", pid);
                continue;
            }

            let Some(provider_symbol) = self.resolver.resolve(pid, symbol, class) else {
                debug!("No '{}' symbol for '{}', trying next provider", pid, symbol);
                continue;
            };

            self.rate_limiter.acquire(pid).await;

            match provider
                .get_candles(&provider_symbol, resolution, from, to)
                .await
            {
                Ok(raw) => {
                    self.circuit_breaker.record_success(pid);

                    match self.validator.safe_validate_candles(&raw) {
                        Some(candles) if !candles.is_empty() => {
                            found = Some(candles);
                            break;
                        }
                        _ => {
                            warn!(
                                "Discarding unusable candle batch for '{}' from '{}'",
                                symbol, pid
                            );
                        }
                    }
                }
                Err(e) => {
                    if e.retry_class() == RetryClass::FailoverWithPenalty {
                        self.circuit_breaker.record_failure(pid);
                    }
                    warn!("Provider '{}' failed candles for '{}': {}", pid, symbol, e);
                }
            }
        }

        match found {
            Some(candles) => {
                self.candle_cache.set(key, &candles);
                candles
            }
            None => {
                debug!("All providers exhausted for candles '{}'", symbol);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MarketDataError;
    use crate::models::{RawCandle, RawQuote};
    use crate::provider::{ProviderCapabilities, RateLimit};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// How a mock provider should misbehave.
    #[derive(Clone, Copy, PartialEq)]
    enum FailMode {
        None,
        /// Generic provider error - no circuit penalty.
        Provider,
        /// Transient fault - takes a circuit penalty.
        RateLimited,
        /// Returns a record with a non-positive price.
        ZeroPrice,
    }

    struct MockProvider {
        id: &'static str,
        priority: u8,
        enabled: bool,
        classes: &'static [AssetClass],
        fail: FailMode,
        delay: Duration,
        price: f64,
        quote_calls: AtomicUsize,
        candle_calls: AtomicUsize,
        last_symbol: Mutex<Option<String>>,
    }

    impl MockProvider {
        fn new(id: &'static str, priority: u8) -> Self {
            Self {
                id,
                priority,
                enabled: true,
                classes: &[AssetClass::Stock],
                fail: FailMode::None,
                delay: Duration::ZERO,
                price: 100.0,
                quote_calls: AtomicUsize::new(0),
                candle_calls: AtomicUsize::new(0),
                last_symbol: Mutex::new(None),
            }
        }

        fn disabled(mut self) -> Self {
            self.enabled = false;
            self
        }

        fn failing(mut self, mode: FailMode) -> Self {
            self.fail = mode;
            self
        }

        fn for_classes(mut self, classes: &'static [AssetClass]) -> Self {
            self.classes = classes;
            self
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn priced(mut self, price: f64) -> Self {
            self.price = price;
            self
        }

        fn quote_calls(&self) -> usize {
            self.quote_calls.load(Ordering::SeqCst)
        }

        fn candle_calls(&self) -> usize {
            self.candle_calls.load(Ordering::SeqCst)
        }

        fn last_symbol(&self) -> Option<String> {
            self.last_symbol.lock().unwrap().clone()
        }

        fn failure(&self) -> MarketDataError {
            match self.fail {
                FailMode::RateLimited => MarketDataError::RateLimited {
                    provider: self.id.to_string(),
                },
                _ => MarketDataError::ProviderError {
                    provider: self.id.to_string(),
                    message: "mock failure".to_string(),
                },
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                asset_classes: self.classes,
                supports_quotes: true,
                supports_candles: true,
            }
        }

        fn rate_limit(&self) -> RateLimit {
            RateLimit {
                requests_per_minute: 60_000, // effectively unlimited in tests
                burst: 1_000,
            }
        }

        async fn get_quote(&self, symbol: &str) -> Result<RawQuote, MarketDataError> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_symbol.lock().unwrap() = Some(symbol.to_string());

            if self.delay > Duration::ZERO {
                tokio::time::sleep(self.delay).await;
            }

            match self.fail {
                FailMode::None => Ok(RawQuote {
                    symbol: symbol.to_string(),
                    price: self.price,
                    change: Some(1.5),
                    change_percent: Some(1.01),
                    high: Some(self.price + 2.0),
                    low: Some(self.price - 2.0),
                    open: Some(self.price - 1.0),
                    previous_close: Some(self.price - 1.5),
                    volume: Some(10_000.0),
                    timestamp_ms: Some(1_704_067_200_000),
                    source: self.id.to_string(),
                }),
                FailMode::ZeroPrice => Ok(RawQuote {
                    symbol: symbol.to_string(),
                    price: 0.0,
                    source: self.id.to_string(),
                    ..Default::default()
                }),
                _ => Err(self.failure()),
            }
        }

        async fn get_candles(
            &self,
            symbol: &str,
            _resolution: &str,
            _from: i64,
            _to: i64,
        ) -> Result<Vec<RawCandle>, MarketDataError> {
            self.candle_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_symbol.lock().unwrap() = Some(symbol.to_string());

            if self.fail != FailMode::None {
                return Err(self.failure());
            }

            Ok(vec![
                RawCandle {
                    time: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    open: 99.0,
                    high: 101.0,
                    low: 98.0,
                    close: 100.0,
                    volume: Some(1_000.0),
                },
                RawCandle {
                    time: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                    open: 100.0,
                    high: 102.0,
                    low: 99.0,
                    close: 101.0,
                    volume: Some(1_100.0),
                },
            ])
        }
    }

    fn aggregator(providers: Vec<Arc<dyn MarketDataProvider>>) -> MarketDataAggregator {
        // Generous TTLs so timing never interferes with cache assertions.
        MarketDataAggregator::with_settings(
            providers,
            Arc::new(RulesResolver::new()),
            AggregatorSettings {
                quote_ttl: Duration::from_secs(60),
                candle_ttl: Duration::from_secs(60),
                persistent: None,
            },
        )
    }

    #[tokio::test]
    async fn test_first_success_short_circuits_cascade() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1));
        let secondary = Arc::new(MockProvider::new("SECONDARY", 2));
        let agg = aggregator(vec![primary.clone(), secondary.clone()]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.source, "PRIMARY");
        assert_eq!(primary.quote_calls(), 1);
        assert_eq!(secondary.quote_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_primary_falls_back() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1).failing(FailMode::Provider));
        let secondary = Arc::new(MockProvider::new("SECONDARY", 2));
        let agg = aggregator(vec![primary.clone(), secondary.clone()]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.source, "SECONDARY");
        assert_eq!(primary.quote_calls(), 1);
        assert_eq!(secondary.quote_calls(), 1);
    }

    #[tokio::test]
    async fn test_disabled_secondary_is_skipped_silently() {
        // The end-to-end shape: primary reports its zero-price sentinel,
        // the snapshot provider is not configured, and the last-resort
        // provider carries the day.
        let primary = Arc::new(MockProvider::new("PRIMARY", 1).failing(FailMode::ZeroPrice));
        let secondary = Arc::new(MockProvider::new("SECONDARY", 2).disabled());
        let tertiary = Arc::new(MockProvider::new("ALPHA_VANTAGE", 3).priced(100.0));
        let agg = aggregator(vec![primary.clone(), secondary.clone(), tertiary.clone()]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.source, "ALPHA_VANTAGE");
        assert_eq!(quote.price, dec!(100));
        assert_eq!(secondary.quote_calls(), 0);
    }

    #[tokio::test]
    async fn test_total_exhaustion_is_none_and_uncached() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1).failing(FailMode::Provider));
        let agg = aggregator(vec![primary.clone()]);

        assert!(agg.get_quote("AAPL").await.is_none());
        assert!(agg.get_quote("AAPL").await.is_none());

        // Failures are not cached - both calls reached the provider.
        assert_eq!(primary.quote_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let primary =
            Arc::new(MockProvider::new("PRIMARY", 1).slow(Duration::from_millis(50)));
        let agg = aggregator(vec![primary.clone()]);

        let (a, b, c, d) = tokio::join!(
            agg.get_quote("AAPL"),
            agg.get_quote("AAPL"),
            agg.get_quote("AAPL"),
            agg.get_quote("AAPL"),
        );

        assert_eq!(primary.quote_calls(), 1);
        let a = a.unwrap();
        assert_eq!(Some(&a), b.as_ref());
        assert_eq!(Some(&a), c.as_ref());
        assert_eq!(Some(&a), d.as_ref());
    }

    #[tokio::test]
    async fn test_sequential_calls_served_from_cache() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1));
        let agg = aggregator(vec![primary.clone()]);

        let first = agg.get_quote("AAPL").await.unwrap();
        let second = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(primary.quote_calls(), 1);
    }

    #[tokio::test]
    async fn test_candles_idempotent_via_cache() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1));
        let agg = aggregator(vec![primary.clone()]);

        let first = agg.get_candles("AAPL", "D", 1_704_000_000, 1_704_300_000).await;
        let second = agg.get_candles("AAPL", "D", 1_704_000_000, 1_704_300_000).await;

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(first[0].time < first[1].time);
        assert_eq!(primary.candle_calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_candle_ranges_are_distinct_keys() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1));
        let agg = aggregator(vec![primary.clone()]);

        agg.get_candles("AAPL", "D", 1_704_000_000, 1_704_300_000).await;
        agg.get_candles("AAPL", "D", 1_704_000_000, 1_704_900_000).await;

        assert_eq!(primary.candle_calls(), 2);
    }

    #[tokio::test]
    async fn test_candle_exhaustion_is_empty_not_error() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1).failing(FailMode::Provider));
        let agg = aggregator(vec![primary.clone()]);

        let candles = agg.get_candles("AAPL", "D", 0, 1).await;
        assert!(candles.is_empty());
    }

    #[tokio::test]
    async fn test_unmapped_crypto_skips_market_data_provider() {
        let gecko = Arc::new(
            MockProvider::new("COINGECKO", 0).for_classes(&[AssetClass::Crypto]),
        );
        let finnhub = Arc::new(
            MockProvider::new("FINNHUB", 1)
                .for_classes(&[AssetClass::Stock, AssetClass::Crypto, AssetClass::Commodity]),
        );
        let agg = aggregator(vec![gecko.clone(), finnhub.clone()]);

        // Not in the crypto id table - still classified as crypto, but the
        // cascade goes straight to the exchange-routed path.
        let quote = agg.get_quote("NOPE-USD").await.unwrap();

        assert_eq!(gecko.quote_calls(), 0);
        assert_eq!(quote.source, "FINNHUB");
        assert_eq!(finnhub.last_symbol().unwrap(), "BINANCE:NOPEUSDT");
    }

    #[tokio::test]
    async fn test_mapped_crypto_uses_market_data_provider_first() {
        let gecko = Arc::new(
            MockProvider::new("COINGECKO", 0).for_classes(&[AssetClass::Crypto]),
        );
        let finnhub = Arc::new(
            MockProvider::new("FINNHUB", 1)
                .for_classes(&[AssetClass::Stock, AssetClass::Crypto, AssetClass::Commodity]),
        );
        let agg = aggregator(vec![gecko.clone(), finnhub.clone()]);

        let quote = agg.get_quote("BTC-USD").await.unwrap();

        assert_eq!(quote.source, "COINGECKO");
        assert_eq!(quote.symbol, "BTC-USD");
        assert_eq!(gecko.last_symbol().unwrap(), "bitcoin");
        assert_eq!(finnhub.quote_calls(), 0);
    }

    #[tokio::test]
    async fn test_commodity_routes_through_exchange_code() {
        let finnhub = Arc::new(
            MockProvider::new("FINNHUB", 1)
                .for_classes(&[AssetClass::Stock, AssetClass::Crypto, AssetClass::Commodity]),
        );
        let agg = aggregator(vec![finnhub.clone()]);

        let quote = agg.get_quote("GC=F").await.unwrap();

        assert_eq!(quote.symbol, "GC=F");
        assert_eq!(finnhub.last_symbol().unwrap(), "OANDA:XAU_USD");
    }

    #[tokio::test]
    async fn test_invalid_record_discarded_and_cascade_continues() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1).failing(FailMode::ZeroPrice));
        let secondary = Arc::new(MockProvider::new("SECONDARY", 2));
        let agg = aggregator(vec![primary.clone(), secondary.clone()]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.source, "SECONDARY");
        assert_eq!(primary.quote_calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_open_the_circuit() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1).failing(FailMode::RateLimited));
        let agg = aggregator(vec![primary.clone()]);

        // Default breaker threshold is five consecutive failures.
        for _ in 0..7 {
            assert!(agg.get_quote("AAPL").await.is_none());
        }

        assert_eq!(primary.quote_calls(), 5);
    }

    #[tokio::test]
    async fn test_wrong_class_provider_not_consulted() {
        let stocks_only = Arc::new(MockProvider::new("PRIMARY", 1));
        let agg = aggregator(vec![stocks_only.clone()]);

        assert!(agg.get_quote("BTC-USD").await.is_none());
        assert_eq!(stocks_only.quote_calls(), 0);
    }
}
