use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical real-time quote.
///
/// This is the only quote shape the aggregation layer hands to callers or
/// stores in the cache. Provider-specific field names never leave the
/// provider modules; every upstream response is decoded into a [`RawQuote`]
/// and validated into this type before any other code sees it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Internal, provider-agnostic symbol ("AAPL", "BTC-USD", "GC=F")
    pub symbol: String,

    /// Last trade price. Always positive - a non-positive price from a
    /// provider means "no data", never a valid zero-price quote.
    pub price: Decimal,

    /// Absolute change since previous close (signed)
    pub change: Decimal,

    /// Percent change since previous close (signed)
    pub change_percent: Decimal,

    /// Session high
    pub high: Decimal,

    /// Session low
    pub low: Decimal,

    /// Session open
    pub open: Decimal,

    /// Previous session close
    pub previous_close: Decimal,

    /// Trading volume (non-negative, may be zero)
    pub volume: Decimal,

    /// Quote timestamp. Defaulted to fetch time when the provider omits it.
    pub timestamp: DateTime<Utc>,

    /// Identifier of the provider that produced this record
    pub source: String,
}

/// Unvalidated quote as decoded at a provider boundary.
///
/// Every numeric field except `price` is optional; loose validation fills
/// the gaps (trade price for the OHLC-style fields, zero for the deltas
/// and volume, fetch time for the timestamp).
#[derive(Clone, Debug, Default)]
pub struct RawQuote {
    pub symbol: String,
    pub price: f64,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub open: Option<f64>,
    pub previous_close: Option<f64>,
    pub volume: Option<f64>,
    /// Epoch milliseconds
    pub timestamp_ms: Option<i64>,
    pub source: String,
}
