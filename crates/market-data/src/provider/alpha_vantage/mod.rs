//! Alpha Vantage market data provider implementation.
//!
//! Last-resort source for stocks. Alpha Vantage has no real-time quote
//! endpoint on the free tier, so a "quote" is synthesized from the company
//! OVERVIEW (symbol confirmation) plus the two most recent closes of the
//! TIME_SERIES_DAILY series. Candles come from the same daily series.
//!
//! Free tier is limited to 5 API calls per minute; the API signals quota
//! exhaustion with a "Note"/"Information" envelope rather than HTTP 429.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{AssetClass, RawCandle, RawQuote};
use crate::provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Daily candles to keep from a compact series fetch.
const COMPACT_SERIES_LIMIT: usize = 100;

// ============================================================================
// API Response Structures
// ============================================================================

/// Company OVERVIEW response. Only the symbol matters here - it confirms
/// the ticker exists before the daily series is fetched.
#[derive(Debug, Deserialize)]
struct OverviewResponse {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// TIME_SERIES_DAILY response.
///
/// The series is keyed by ISO date, so a BTreeMap keeps it chronologically
/// ordered for free.
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, DailyBar>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

// ============================================================================
// AlphaVantageProvider
// ============================================================================

/// Alpha Vantage market data provider.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider with the given API key.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    /// Make a GET request to the Alpha Vantage API.
    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        debug!("Alpha Vantage request with {} params", params.len());

        let mut request = self.client.get(BASE_URL);
        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }
        request = request.query(&[("apikey", self.api_key.as_str())]);

        let response = request.send().await.map_err(|e| {
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

    /// Check for the API's in-band error envelopes.
    ///
    /// Alpha Vantage returns HTTP 200 with an "Error Message" for bad
    /// symbols and a "Note"/"Information" blurb when the quota is spent.
    fn check_api_error(
        error_message: &Option<String>,
        note: &Option<String>,
        information: &Option<String>,
    ) -> Result<(), MarketDataError> {
        if let Some(message) = error_message {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: message.clone(),
            });
        }
        if note.is_some() || information.is_some() {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        Ok(())
    }

    async fn fetch_daily_series(
        &self,
        symbol: &str,
    ) -> Result<BTreeMap<String, DailyBar>, MarketDataError> {
        let params = [
            ("function", "TIME_SERIES_DAILY"),
            ("symbol", symbol),
            ("outputsize", "compact"),
        ];
        let text = self.fetch(&params).await?;

        let response: TimeSeriesResponse =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse daily series: {}", e),
            })?;

        Self::check_api_error(&response.error_message, &response.note, &response.information)?;

        response
            .time_series
            .filter(|series| !series.is_empty())
            .ok_or(MarketDataError::NoDataForRange)
    }
}

fn parse_price(s: &str, what: &str, symbol: &str) -> Option<f64> {
    match s.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Unparseable {} '{}' in daily series for {}", what, s, symbol);
            None
        }
    }
}

/// Synthesize a quote from a daily series: the most recent close is the
/// price, and change/change-percent come from the two most recent closes.
fn quote_from_daily(
    symbol: &str,
    series: &BTreeMap<String, DailyBar>,
) -> Result<RawQuote, MarketDataError> {
    // BTreeMap iterates oldest-first; walk from the newest end.
    let mut days = series.iter().rev();

    let (_, latest) = days.next().ok_or(MarketDataError::NoDataForRange)?;
    let price = parse_price(&latest.close, "close", symbol)
        .ok_or(MarketDataError::NoDataForRange)?;

    let previous_close = days
        .next()
        .and_then(|(_, bar)| parse_price(&bar.close, "close", symbol))
        .filter(|prev| *prev > 0.0);

    let (change, change_percent) = match previous_close {
        Some(prev) => {
            let change = price - prev;
            (Some(change), Some(change / prev * 100.0))
        }
        None => (None, None),
    };

    Ok(RawQuote {
        symbol: symbol.to_string(),
        price,
        change,
        change_percent,
        high: parse_price(&latest.high, "high", symbol),
        low: parse_price(&latest.low, "low", symbol),
        open: parse_price(&latest.open, "open", symbol),
        previous_close,
        volume: parse_price(&latest.volume, "volume", symbol),
        // Daily data carries no intraday time; validation stamps fetch time.
        timestamp_ms: None,
        source: PROVIDER_ID.to_string(),
    })
}

/// Convert a daily series into raw candles, ascending, capped at the
/// compact window size (most recent days win).
fn candles_from_daily(
    symbol: &str,
    series: &BTreeMap<String, DailyBar>,
) -> Result<Vec<RawCandle>, MarketDataError> {
    let mut candles: Vec<RawCandle> = Vec::with_capacity(series.len().min(COMPACT_SERIES_LIMIT));

    for (date, bar) in series.iter().rev().take(COMPACT_SERIES_LIMIT) {
        let Ok(time) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            warn!("Unparseable date '{}' in daily series for {}", date, symbol);
            continue;
        };

        let parsed = (
            parse_price(&bar.open, "open", symbol),
            parse_price(&bar.high, "high", symbol),
            parse_price(&bar.low, "low", symbol),
            parse_price(&bar.close, "close", symbol),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = parsed else {
            continue;
        };

        candles.push(RawCandle {
            time,
            open,
            high,
            low,
            close,
            volume: parse_price(&bar.volume, "volume", symbol),
        });
    }

    if candles.is_empty() {
        return Err(MarketDataError::NoDataForRange);
    }

    candles.reverse();
    Ok(candles)
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Last resort - slow, heavily rate limited
        3
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
        // Confirm the ticker exists before spending another call on the
        // series. OVERVIEW returns an empty object for unknown symbols.
        let params = [("function", "OVERVIEW"), ("symbol", symbol)];
        let text = self.fetch(&params).await?;

        let overview: OverviewResponse =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse overview response: {}", e),
            })?;

        Self::check_api_error(&overview.error_message, &overview.note, &overview.information)?;

        if overview.symbol.is_none() {
            return Err(MarketDataError::SymbolNotFound(format!(
                "No overview data for symbol: {}",
                symbol
            )));
        }

        let series = self.fetch_daily_series(symbol).await?;
        quote_from_daily(symbol, &series)
    }

    async fn get_candles(
        &self,
        symbol: &str,
        _resolution: &str,
        _from: i64,
        _to: i64,
    ) -> Result<Vec<RawCandle>, MarketDataError> {
        // The compact daily series is the only granularity available;
        // range trimming is left to the caller's charting layer.
        let series = self.fetch_daily_series(symbol).await?;
        candles_from_daily(symbol, &series)
    }
}

// ============================================================================
// Tests
// ============================================================================
