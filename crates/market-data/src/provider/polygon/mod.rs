//! Polygon.io market data provider implementation.
//!
//! Secondary snapshot source for US stocks:
//! - Quotes via the full-ticker snapshot endpoint
//! - Candles via the aggregates (bars) endpoint
//!
//! Requires an API key; the provider reports itself disabled without one.
//! API documentation: https://polygon.io/docs/stocks

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{AssetClass, RawCandle, RawQuote};
use crate::provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

const BASE_URL: &str = "https://api.polygon.io";
const PROVIDER_ID: &str = "POLYGON";

// ============================================================================
// API Response Structures
// ============================================================================

/// Daily bar embedded in the snapshot response
#[derive(Debug, Default, Deserialize)]
struct DayBar {
    #[serde(default)]
    c: f64,
    #[serde(default)]
    h: f64,
    #[serde(default)]
    l: f64,
    #[serde(default)]
    o: f64,
    #[serde(default)]
    v: f64,
}

/// Last trade embedded in the snapshot response
#[derive(Debug, Default, Deserialize)]
struct LastTrade {
    #[serde(default)]
    p: f64,
}

/// Previous-day bar embedded in the snapshot response
#[derive(Debug, Default, Deserialize)]
struct PrevDayBar {
    #[serde(default)]
    c: f64,
}

/// Ticker snapshot from /v2/snapshot/locale/us/markets/stocks/tickers/{sym}
#[derive(Debug, Deserialize)]
struct SnapshotTicker {
    #[serde(default)]
    day: DayBar,
    #[serde(rename = "lastTrade", default)]
    last_trade: LastTrade,
    #[serde(rename = "prevDay", default)]
    prev_day: PrevDayBar,
    #[serde(rename = "todaysChange")]
    todays_change: Option<f64>,
    #[serde(rename = "todaysChangePerc")]
    todays_change_perc: Option<f64>,
    /// Last update time in epoch nanoseconds
    updated: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    ticker: Option<SnapshotTicker>,
}

/// Single bar from the aggregates endpoint
#[derive(Debug, Deserialize)]
struct AggregateBar {
    /// Bar start time in epoch milliseconds
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    #[serde(default)]
    v: f64,
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    results: Vec<AggregateBar>,
}

// ============================================================================
// PolygonProvider
// ============================================================================

/// Polygon.io market data provider.
pub struct PolygonProvider {
    client: Client,
    api_key: String,
}

impl PolygonProvider {
    /// Create a new Polygon provider with the given API key.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    /// Make a GET request to the Polygon API.
    async fn fetch(&self, path: &str) -> Result<String, MarketDataError> {
        let url = format!("{}{}", BASE_URL, path);

        debug!("Polygon request: {}", path);

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::ProviderError {
                        provider: PROVIDER_ID.to_string(),
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: "Invalid or missing API key".to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to read response: {}", e),
            })
    }

    /// Map a chart resolution to a Polygon aggregate timespan.
    fn timespan(resolution: &str) -> &'static str {
        match resolution {
            "W" => "week",
            _ => "day",
        }
    }

    /// Format an epoch-seconds bound as the YYYY-MM-DD form the
    /// aggregates endpoint expects.
    fn date_param(epoch_seconds: i64) -> Option<String> {
        Utc.timestamp_opt(epoch_seconds, 0)
            .single()
            .map(|ts| ts.format("%Y-%m-%d").to_string())
    }
}

/// Convert a snapshot payload into a raw quote.
///
/// The day bar's close is preferred; when the bar is still empty (early
/// session) the last trade price is used instead.
fn quote_from_snapshot(
    symbol: &str,
    response: SnapshotResponse,
) -> Result<RawQuote, MarketDataError> {
    let ticker = response
        .ticker
        .ok_or_else(|| MarketDataError::SymbolNotFound(format!("No snapshot for: {}", symbol)))?;

    let price = if ticker.day.c > 0.0 {
        ticker.day.c
    } else {
        ticker.last_trade.p
    };

    if price <= 0.0 {
        return Err(MarketDataError::SymbolNotFound(format!(
            "Snapshot has no trade data for: {}",
            symbol
        )));
    }

    let positive = |v: f64| (v > 0.0).then_some(v);

    Ok(RawQuote {
        symbol: symbol.to_string(),
        price,
        change: ticker.todays_change,
        change_percent: ticker.todays_change_perc,
        high: positive(ticker.day.h),
        low: positive(ticker.day.l),
        open: positive(ticker.day.o),
        previous_close: positive(ticker.prev_day.c),
        volume: Some(ticker.day.v),
        // `updated` is epoch nanoseconds
        timestamp_ms: ticker.updated.filter(|t| *t > 0).map(|t| t / 1_000_000),
        source: PROVIDER_ID.to_string(),
    })
}

/// Convert an aggregates payload into raw candles, ordered ascending.
fn candles_from_aggregates(
    symbol: &str,
    response: AggregatesResponse,
) -> Result<Vec<RawCandle>, MarketDataError> {
    if response.results.is_empty() {
        return Err(MarketDataError::NoDataForRange);
    }

    let mut candles = Vec::with_capacity(response.results.len());

    for bar in &response.results {
        let time = match Utc.timestamp_millis_opt(bar.t).single() {
            Some(ts) => ts.date_naive(),
            None => {
                warn!("Invalid bar timestamp for {}: {}", symbol, bar.t);
                continue;
            }
        };

        candles.push(RawCandle {
            time,
            open: bar.o,
            high: bar.h,
            low: bar.l,
            close: bar.c,
            volume: Some(bar.v),
        });
    }

    candles.sort_by_key(|c| c.time);

    Ok(candles)
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for PolygonProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Second in line after the primary quote source
        2
    }

    fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            asset_classes: &[AssetClass::Stock],
            supports_quotes: true,
            supports_candles: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 5, // Free tier limit
            burst: 5,
        }
    }

    async fn get_quote(&self, symbol: &str) -> Result<RawQuote, MarketDataError> {
        let path = format!("/v2/snapshot/locale/us/markets/stocks/tickers/{}", symbol);
        let text = self.fetch(&path).await?;

        let response: SnapshotResponse =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse snapshot response: {}", e),
            })?;

        quote_from_snapshot(symbol, response)
    }

    async fn get_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<RawCandle>, MarketDataError> {
        let (from_date, to_date) = match (Self::date_param(from), Self::date_param(to)) {
            (Some(f), Some(t)) => (f, t),
            _ => return Err(MarketDataError::NoDataForRange),
        };

        let path = format!(
            "/v2/aggs/ticker/{}/range/1/{}/{}/{}",
            symbol,
            Self::timespan(resolution),
            from_date,
            to_date
        );
        let text = self.fetch(&path).await?;

        let response: AggregatesResponse =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse aggregates response: {}", e),
            })?;

        candles_from_aggregates(symbol, response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT_JSON: &str = r#"{
        "ticker": {
            "day": {"c": 150.25, "h": 152.0, "l": 148.5, "o": 149.0, "v": 42000000},
            "lastTrade": {"p": 150.30},
            "prevDay": {"c": 148.75},
            "todaysChange": 1.50,
            "todaysChangePerc": 1.01,
            "updated": 1704067200000000000
        }
    }"#;

    #[test]
    fn test_provider_id_and_enablement() {
        let provider = PolygonProvider::new("test_key".to_string());
        assert_eq!(provider.id(), "POLYGON");
        assert_eq!(provider.priority(), 2);
        assert!(provider.is_enabled());

        let disabled = PolygonProvider::new(String::new());
        assert!(!disabled.is_enabled());
    }

    #[test]
    fn test_snapshot_to_raw_quote() {
        let response: SnapshotResponse = serde_json::from_str(SNAPSHOT_JSON).unwrap();
        let raw = quote_from_snapshot("AAPL", response).unwrap();

        assert_eq!(raw.price, 150.25);
        assert_eq!(raw.change, Some(1.50));
        assert_eq!(raw.change_percent, Some(1.01));
        assert_eq!(raw.previous_close, Some(148.75));
        assert_eq!(raw.volume, Some(42_000_000.0));
        assert_eq!(raw.timestamp_ms, Some(1_704_067_200_000));
        assert_eq!(raw.source, "POLYGON");
    }

    #[test]
    fn test_empty_day_bar_falls_back_to_last_trade() {
        let json = r#"{
            "ticker": {
                "day": {"c": 0, "h": 0, "l": 0, "o": 0, "v": 0},
                "lastTrade": {"p": 99.5},
                "prevDay": {"c": 98.0}
            }
        }"#;

        let response: SnapshotResponse = serde_json::from_str(json).unwrap();
        let raw = quote_from_snapshot("XYZ", response).unwrap();

        assert_eq!(raw.price, 99.5);
        assert_eq!(raw.high, None);
        assert_eq!(raw.previous_close, Some(98.0));
    }

    #[test]
    fn test_missing_ticker_is_not_found() {
        let response: SnapshotResponse = serde_json::from_str(r#"{"ticker": null}"#).unwrap();
        let result = quote_from_snapshot("NOPE", response);
        assert!(matches!(result, Err(MarketDataError::SymbolNotFound(_))));
    }

    #[test]
    fn test_aggregates_to_raw_candles() {
        let json = r#"{
            "results": [
                {"t": 1704153600000, "o": 150.5, "h": 152.0, "l": 150.0, "c": 151.0, "v": 1100000},
                {"t": 1704067200000, "o": 149.5, "h": 151.0, "l": 149.0, "c": 150.0, "v": 1000000}
            ]
        }"#;

        let response: AggregatesResponse = serde_json::from_str(json).unwrap();
        let candles = candles_from_aggregates("AAPL", response).unwrap();

        assert_eq!(candles.len(), 2);
        // Sorted ascending even though the payload was not
        assert!(candles[0].time < candles[1].time);
        assert_eq!(candles[0].close, 150.0);
    }

    #[test]
    fn test_empty_aggregates_is_no_data() {
        let response: AggregatesResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        let result = candles_from_aggregates("AAPL", response);
        assert!(matches!(result, Err(MarketDataError::NoDataForRange)));
    }

    #[test]
    fn test_timespan_mapping() {
        assert_eq!(PolygonProvider::timespan("D"), "day");
        assert_eq!(PolygonProvider::timespan("W"), "week");
        assert_eq!(PolygonProvider::timespan("60"), "day");
    }
}
