//! Quote and candle validation.
//!
//! The boundary between raw provider output and the canonical types.
//! Nothing reaches the cache or a caller without passing through here.
//!
//! Two modes:
//! - strict: every field present, finite, and in range - used when
//!   ingested data is supposed to be complete (contract tests, replays)
//! - loose: fills the gaps providers legitimately leave (trade price for
//!   session fields, zero for deltas and volume, fetch time for the
//!   timestamp) - used for live provider responses
//!
//! The `safe_*` variants never fail; they log and return `None`, which is
//! what the aggregator cascade wants when upstream data quality cannot be
//! trusted.

use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use rust_decimal::Decimal;

use crate::errors::ValidationError;
use crate::models::{Candle, Quote, RawCandle, RawQuote};

/// Validates raw provider records into canonical shapes.
#[derive(Debug, Default)]
pub struct QuoteValidator;

fn check_finite(value: f64, field: &str) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::new(field, value, "expected finite number"))
    }
}

fn to_decimal(value: f64, field: &str) -> Result<Decimal, ValidationError> {
    check_finite(value, field)?;
    Decimal::try_from(value)
        .map_err(|_| ValidationError::new(field, value, "not representable as a decimal"))
}

fn positive(value: f64, field: &str) -> Result<Decimal, ValidationError> {
    if value > 0.0 {
        to_decimal(value, field)
    } else {
        Err(ValidationError::new(field, value, "expected positive number"))
    }
}

fn non_negative(value: f64, field: &str) -> Result<Decimal, ValidationError> {
    if value >= 0.0 {
        to_decimal(value, field)
    } else {
        Err(ValidationError::new(
            field,
            value,
            "expected non-negative number",
        ))
    }
}

fn signed(value: f64, field: &str) -> Result<Decimal, ValidationError> {
    to_decimal(value, field)
}

fn required(value: Option<f64>, field: &str) -> Result<f64, ValidationError> {
    value.ok_or_else(|| ValidationError::new(field, "absent", "expected number"))
}

fn non_empty(value: &str, field: &str) -> Result<String, ValidationError> {
    if value.is_empty() {
        Err(ValidationError::new(field, "\"\"", "expected non-empty string"))
    } else {
        Ok(value.to_string())
    }
}

fn timestamp_from_ms(ms: i64, field: &str) -> Result<DateTime<Utc>, ValidationError> {
    if ms <= 0 {
        return Err(ValidationError::new(field, ms, "expected positive timestamp"));
    }
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| ValidationError::new(field, ms, "timestamp out of range"))
}

impl QuoteValidator {
    pub fn new() -> Self {
        Self
    }

    /// Strict validation: every field must be present and in range.
    pub fn validate(&self, raw: &RawQuote) -> Result<Quote, ValidationError> {
        Ok(Quote {
            symbol: non_empty(&raw.symbol, "symbol")?,
            price: positive(raw.price, "price")?,
            change: signed(required(raw.change, "change")?, "change")?,
            change_percent: signed(
                required(raw.change_percent, "change_percent")?,
                "change_percent",
            )?,
            high: positive(required(raw.high, "high")?, "high")?,
            low: positive(required(raw.low, "low")?, "low")?,
            open: positive(required(raw.open, "open")?, "open")?,
            previous_close: positive(
                required(raw.previous_close, "previous_close")?,
                "previous_close",
            )?,
            volume: non_negative(raw.volume.unwrap_or(0.0), "volume")?,
            timestamp: timestamp_from_ms(
                raw.timestamp_ms
                    .ok_or_else(|| ValidationError::new("timestamp", "absent", "expected number"))?,
                "timestamp",
            )?,
            source: non_empty(&raw.source, "source")?,
        })
    }

    /// Loose validation: substitutes defaults for fields a provider may
    /// legitimately omit. A present-but-invalid field still fails.
    pub fn validate_loose(&self, raw: &RawQuote) -> Result<Quote, ValidationError> {
        let price = positive(raw.price, "price")?;
        let session = |value: Option<f64>, field: &str| -> Result<Decimal, ValidationError> {
            match value {
                Some(v) => positive(v, field),
                None => Ok(price),
            }
        };

        let timestamp = match raw.timestamp_ms {
            Some(ms) if ms > 0 => timestamp_from_ms(ms, "timestamp")?,
            _ => Utc::now(),
        };

        Ok(Quote {
            symbol: non_empty(&raw.symbol, "symbol")?,
            price,
            change: signed(raw.change.unwrap_or(0.0), "change")?,
            change_percent: signed(raw.change_percent.unwrap_or(0.0), "change_percent")?,
            high: session(raw.high, "high")?,
            low: session(raw.low, "low")?,
            open: session(raw.open, "open")?,
            previous_close: session(raw.previous_close, "previous_close")?,
            volume: non_negative(raw.volume.unwrap_or(0.0), "volume")?,
            timestamp,
            source: if raw.source.is_empty() {
                "unknown".to_string()
            } else {
                raw.source.clone()
            },
        })
    }

    /// Strict per-element candle validation.
    ///
    /// The output is normalized: ordered by time ascending, duplicate
    /// dates collapsed (the last record for a date wins).
    pub fn validate_candles(&self, raw: &[RawCandle]) -> Result<Vec<Candle>, ValidationError> {
        let mut by_date = std::collections::BTreeMap::new();

        for (i, candle) in raw.iter().enumerate() {
            by_date.insert(
                candle.time,
                Candle {
                    time: candle.time,
                    open: positive(candle.open, &format!("candles[{}].open", i))?,
                    high: positive(candle.high, &format!("candles[{}].high", i))?,
                    low: positive(candle.low, &format!("candles[{}].low", i))?,
                    close: positive(candle.close, &format!("candles[{}].close", i))?,
                    volume: non_negative(
                        candle.volume.unwrap_or(0.0),
                        &format!("candles[{}].volume", i),
                    )?,
                },
            );
        }

        Ok(by_date.into_values().collect())
    }

    /// Loose validation that never fails - the aggregator boundary.
    pub fn safe_validate(&self, raw: &RawQuote) -> Option<Quote> {
        match self.validate_loose(raw) {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!("Discarding quote for '{}' from '{}': {}", raw.symbol, raw.source, e);
                None
            }
        }
    }

    /// Candle validation that never fails - the aggregator boundary.
    pub fn safe_validate_candles(&self, raw: &[RawCandle]) -> Option<Vec<Candle>> {
        match self.validate_candles(raw) {
            Ok(candles) => Some(candles),
            Err(e) => {
                warn!("Discarding candle batch: {}", e);
                None
            }
        }
    }
}
