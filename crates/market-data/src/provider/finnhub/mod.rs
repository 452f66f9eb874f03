//! Finnhub market data provider implementation.
//!
//! Primary source for the cascade:
//! - Stock quotes via /quote, stock candles via /stock/candle
//! - Crypto via exchange-routed symbols ("BINANCE:BTCUSDT")
//! - Commodities and metals via OANDA-routed symbols ("OANDA:XAU_USD")
//!
//! The exchange-routed symbols are produced by the resolver; this module
//! only speaks Finnhub's wire format. Free tier is limited to 60 calls
//! per minute. API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{AssetClass, RawCandle, RawQuote};
use crate::provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Absolute change
    d: Option<f64>,
    /// Percent change
    dp: Option<f64>,
    /// High price of the day
    h: Option<f64>,
    /// Low price of the day
    l: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
    /// Previous close price
    pc: Option<f64>,
    /// Timestamp (Unix seconds)
    t: Option<i64>,
}

/// Response from /stock/candle endpoint
#[derive(Debug, Deserialize)]
struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    /// Close prices
    #[serde(default)]
    c: Vec<f64>,
    /// High prices
    #[serde(default)]
    h: Vec<f64>,
    /// Low prices
    #[serde(default)]
    l: Vec<f64>,
    /// Open prices
    #[serde(default)]
    o: Vec<f64>,
    /// Volume
    #[serde(default)]
    v: Vec<f64>,
    /// Timestamps (Unix seconds)
    #[serde(default)]
    t: Vec<i64>,
}

/// Error response from Finnhub
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub market data provider.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    /// Make a GET request to the Finnhub API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        let mut request = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key);

        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!("Finnhub request: {} with {} params", endpoint, params.len());

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

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: "Invalid or missing API key".to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(error_msg) = error_resp.error {
                    return Err(MarketDataError::ProviderError {
                        provider: PROVIDER_ID.to_string(),
                        message: error_msg,
                    });
                }
            }

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
}

/// Convert a /quote payload into a raw quote.
///
/// Finnhub reports a zero price (rather than an error) for unknown
/// symbols, so a non-positive `c` is the not-found sentinel. Zeroed
/// high/low/open/previous-close fields mean "not provided" and are mapped
/// to absent so loose validation can fill them.
fn quote_from_response(symbol: &str, response: QuoteResponse) -> Result<RawQuote, MarketDataError> {
    let price = response.c.unwrap_or(0.0);
    if price <= 0.0 {
        return Err(MarketDataError::SymbolNotFound(format!(
            "Symbol not found or no trading data: {}",
            symbol
        )));
    }

    let positive = |v: Option<f64>| v.filter(|x| *x > 0.0);

    Ok(RawQuote {
        symbol: symbol.to_string(),
        price,
        change: response.d,
        change_percent: response.dp,
        high: positive(response.h),
        low: positive(response.l),
        open: positive(response.o),
        previous_close: positive(response.pc),
        volume: None, // /quote endpoint doesn't provide volume
        timestamp_ms: response.t.filter(|t| *t > 0).map(|t| t * 1000),
        source: PROVIDER_ID.to_string(),
    })
}

/// Convert a /stock/candle payload into raw candles, ordered ascending.
fn candles_from_response(
    symbol: &str,
    response: CandleResponse,
) -> Result<Vec<RawCandle>, MarketDataError> {
    if response.s == "no_data" {
        return Err(MarketDataError::NoDataForRange);
    }

    if response.s != "ok" {
        return Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Unexpected candle status: {}", response.s),
        });
    }

    let len = response.t.len();
    if response.c.len() != len
        || response.o.len() != len
        || response.h.len() != len
        || response.l.len() != len
    {
        return Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: "Mismatched array lengths in candle response".to_string(),
        });
    }

    if len == 0 {
        return Err(MarketDataError::NoDataForRange);
    }

    let mut candles = Vec::with_capacity(len);

    for i in 0..len {
        let time = match Utc.timestamp_opt(response.t[i], 0).single() {
            Some(ts) => ts.date_naive(),
            None => {
                warn!(
                    "Invalid candle timestamp for {} at index {}: {}",
                    symbol, i, response.t[i]
                );
                continue;
            }
        };

        candles.push(RawCandle {
            time,
            open: response.o[i],
            high: response.h[i],
            low: response.l[i],
            close: response.c[i],
            volume: response.v.get(i).copied(),
        });
    }

    candles.sort_by_key(|c| c.time);

    Ok(candles)
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Primary source for everything it covers
        1
    }

    fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            // Crypto and commodities are served through exchange-routed
            // symbols produced by the resolver.
            asset_classes: &[AssetClass::Stock, AssetClass::Crypto, AssetClass::Commodity],
            supports_quotes: true,
            supports_candles: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60, // Free tier limit
            burst: 10,
        }
    }

    async fn get_quote(&self, symbol: &str) -> Result<RawQuote, MarketDataError> {
        let params = [("symbol", symbol)];
        let text = self.fetch("/quote", &params).await?;

        let response: QuoteResponse =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse quote response: {}", e),
            })?;

        quote_from_response(symbol, response)
    }

    async fn get_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<RawCandle>, MarketDataError> {
        let from_ts = from.to_string();
        let to_ts = to.to_string();
        let params = [
            ("symbol", symbol),
            ("resolution", resolution),
            ("from", from_ts.as_str()),
            ("to", to_ts.as_str()),
        ];

        let text = self.fetch("/stock/candle", &params).await?;

        let response: CandleResponse =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse candle response: {}", e),
            })?;

        candles_from_response(symbol, response)
    }
}

// ============================================================================
// Tests
// ============================================================================
