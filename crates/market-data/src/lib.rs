//! Quotecast Market Data Crate
//!
//! A unified, resilient interface for real-time quotes and historical
//! candles across heterogeneous instruments (stocks, crypto, metals,
//! commodities), aggregating upstream providers that each have partial
//! coverage, inconsistent symbol formats, rate limits, and unreliable
//! uptime.
//!
//! # Overview
//!
//! The crate supports:
//! - Multiple asset classes, classified from symbol syntax
//! - Multiple providers with an ordered fallback cascade per class
//! - Collapsing of concurrent identical requests into one upstream call
//! - Two-tier caching (in-process memory + optional persistent disk)
//! - Rate limiting and circuit breaking per provider
//!
//! # Architecture
//!
//! ```text
//! caller -> MarketDataAggregator.get_quote / get_candles
//!                   |
//!                   v
//!            +--------------+
//!            | Deduplicator |  (one in-flight fetch per key)
//!            +--------------+
//!                   |
//!                   v
//!            +--------------+
//!            |  CacheStore  |  (memory tier -> persistent tier)
//!            +--------------+
//!                   | miss
//!                   v
//!            +--------------+     +----------------+
//!            |  AssetClass  | --> | SymbolResolver |  (provider symbol)
//!            +--------------+     +----------------+
//!                   |
//!                   v
//!            +--------------+
//!            |   Cascade    |  (providers by priority, first success wins)
//!            +--------------+
//!                   |
//!                   v
//!            +--------------+
//!            |  Validator   |  (RawQuote/RawCandle -> Quote/Candle)
//!            +--------------+
//! ```
//!
//! Upstream failures never escape the aggregator: an unanswerable quote
//! request is `None`, an unanswerable candle request is an empty vector.
//!
//! # Core Types
//!
//! - [`MarketDataAggregator`] - the service object, built once per process
//! - [`Quote`] / [`Candle`] - canonical market data shapes
//! - [`RawQuote`] / [`RawCandle`] - unvalidated provider-boundary shapes
//! - [`MarketDataProvider`] - trait implemented by upstream clients
//! - [`AssetClass`] - classification derived from symbol syntax

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod models;
pub mod provider;
pub mod resolver;

// Re-export the model types
pub use models::{AssetClass, Candle, ProviderId, ProviderSymbol, Quote, RawCandle, RawQuote};

// Re-export error types
pub use errors::{MarketDataError, RetryClass, ValidationError};

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::polygon::PolygonProvider;
pub use provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

// Re-export resolver types
pub use resolver::{
    crypto_asset_id, exchange_code, symbol_for_crypto_asset_id, symbol_for_exchange_code,
    RulesResolver, SymbolResolver,
};

// Re-export cache and dedup types
pub use cache::{CacheStore, FsStore, PersistedEntry, PersistentStore};
pub use dedup::Deduplicator;

// Re-export the aggregation service
pub use aggregator::{
    AggregatorSettings, CircuitBreaker, CircuitBreakerConfig, CircuitState,
    MarketDataAggregator, QuoteValidator, RateLimiter, DEFAULT_CANDLE_TTL, DEFAULT_QUOTE_TTL,
};
pub use config::AggregatorConfig;
