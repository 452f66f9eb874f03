//! Aggregator configuration.
//!
//! A plain data struct consumed by
//! [`MarketDataAggregator::from_config`](crate::MarketDataAggregator::from_config).
//! The library never reads the environment itself; the embedding
//! application decides where keys and paths come from.

use std::path::PathBuf;
use std::time::Duration;

use crate::aggregator::{DEFAULT_CANDLE_TTL, DEFAULT_QUOTE_TTL};

/// Configuration for the standard provider set and cache.
#[derive(Clone, Debug)]
pub struct AggregatorConfig {
    /// API key for the primary provider. Empty leaves it disabled.
    pub finnhub_api_key: String,

    /// API key for the snapshot provider. Empty leaves it disabled.
    pub polygon_api_key: String,

    /// API key for the last-resort provider. Empty leaves it disabled.
    pub alpha_vantage_api_key: String,

    /// Directory for the persistent cache tier. `None` caches in memory
    /// only (e.g. environments without durable local storage).
    pub cache_dir: Option<PathBuf>,

    /// Freshness window for quotes.
    pub quote_ttl: Duration,

    /// Freshness window for candles.
    pub candle_ttl: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            finnhub_api_key: String::new(),
            polygon_api_key: String::new(),
            alpha_vantage_api_key: String::new(),
            cache_dir: None,
            quote_ttl: DEFAULT_QUOTE_TTL,
            candle_ttl: DEFAULT_CANDLE_TTL,
        }
    }
}
