use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical OHLCV record for one time bucket.
///
/// A validated sequence of candles for one symbol/resolution/range is
/// ordered by `time` ascending and contains no duplicate dates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Calendar date of the bucket
    pub time: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Non-negative, may be zero (some upstreams omit volume entirely)
    pub volume: Decimal,
}

/// Unvalidated candle as decoded at a provider boundary.
#[derive(Clone, Copy, Debug)]
pub struct RawCandle {
    pub time: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}
