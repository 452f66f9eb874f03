//! CoinGecko market data provider implementation.
//!
//! First-choice source for crypto pairs. Operates on CoinGecko asset ids
//! ("bitcoin", "ethereum") produced by the resolver - symbols without an
//! id mapping never reach this provider.
//!
//! - Quotes via /simple/price (price, 24h change, 24h volume)
//! - Candles via /coins/{id}/ohlc, falling back to the market-chart close
//!   series when the OHLC endpoint has nothing
//!
//! The public API needs no key. API documentation:
//! https://docs.coingecko.com/reference/introduction

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{AssetClass, RawCandle, RawQuote};
use crate::provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "COINGECKO";

/// Day windows accepted by the OHLC endpoint.
const VALID_OHLC_DAYS: [i64; 7] = [1, 7, 14, 30, 90, 180, 365];

// ============================================================================
// API Response Structures
// ============================================================================

/// Per-coin entry in the /simple/price response
#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    usd_24h_vol: Option<f64>,
    /// Epoch seconds
    last_updated_at: Option<i64>,
}

/// Fallback /coins/{id}/market_chart response
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    /// [epoch_ms, price] pairs
    #[serde(default)]
    prices: Vec<[f64; 2]>,
}

// ============================================================================
// CoinGeckoProvider
// ============================================================================

/// CoinGecko market data provider.
pub struct CoinGeckoProvider {
    client: Client,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Make a GET request to the CoinGecko API.
    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", BASE_URL, path);

        debug!("CoinGecko request: {}", path);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::Network(e)
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound(path.to_string()));
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

    /// Snap a seconds range onto the day windows the OHLC endpoint accepts.
    fn days_param(from: i64, to: i64) -> String {
        let span_days = ((to - from).max(0) as u64).div_ceil(86_400) as i64;
        VALID_OHLC_DAYS
            .iter()
            .find(|d| **d >= span_days)
            .map(|d| d.to_string())
            .unwrap_or_else(|| "max".to_string())
    }

    async fn fetch_ohlc(&self, asset_id: &str, days: &str) -> Result<Vec<RawCandle>, MarketDataError> {
        let path = format!("/coins/{}/ohlc", asset_id);
        let params = [("vs_currency", "usd"), ("days", days)];
        let text = self.fetch(&path, &params).await?;

        // Rows are [epoch_ms, open, high, low, close]
        let rows: Vec<[f64; 5]> =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse OHLC response: {}", e),
            })?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(time) = Utc.timestamp_millis_opt(row[0] as i64).single() else {
                warn!("Invalid OHLC timestamp for {}: {}", asset_id, row[0]);
                continue;
            };

            candles.push(RawCandle {
                time: time.date_naive(),
                open: row[1],
                high: row[2],
                low: row[3],
                close: row[4],
                volume: None, // OHLC endpoint carries no volume
            });
        }

        candles.sort_by_key(|c| c.time);
        Ok(candles)
    }

    /// Fallback: flatten the market-chart close series into candles.
    async fn fetch_market_chart(
        &self,
        asset_id: &str,
        days: &str,
    ) -> Result<Vec<RawCandle>, MarketDataError> {
        let path = format!("/coins/{}/market_chart", asset_id);
        let params = [("vs_currency", "usd"), ("days", days)];
        let text = self.fetch(&path, &params).await?;

        let response: MarketChartResponse =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse market chart response: {}", e),
            })?;

        let mut candles = Vec::with_capacity(response.prices.len());
        for [ts, price] in response.prices {
            let Some(time) = Utc.timestamp_millis_opt(ts as i64).single() else {
                warn!("Invalid chart timestamp for {}: {}", asset_id, ts);
                continue;
            };

            candles.push(RawCandle {
                time: time.date_naive(),
                open: price,
                high: price,
                low: price,
                close: price,
                volume: None,
            });
        }

        candles.sort_by_key(|c| c.time);
        Ok(candles)
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Ahead of the exchange-routed primary for the pairs it covers
        0
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            asset_classes: &[AssetClass::Crypto],
            supports_quotes: true,
            supports_candles: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 30, // Public API allowance
            burst: 10,
        }
    }

    async fn get_quote(&self, asset_id: &str) -> Result<RawQuote, MarketDataError> {
        let params = [
            ("ids", asset_id),
            ("vs_currencies", "usd"),
            ("include_24hr_change", "true"),
            ("include_24hr_vol", "true"),
            ("include_last_updated_at", "true"),
        ];
        let text = self.fetch("/simple/price", &params).await?;

        let mut response: HashMap<String, SimplePrice> =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse price response: {}", e),
            })?;

        let coin = response
            .remove(asset_id)
            .ok_or_else(|| MarketDataError::SymbolNotFound(asset_id.to_string()))?;

        let price = coin.usd.unwrap_or(0.0);
        if price <= 0.0 {
            return Err(MarketDataError::SymbolNotFound(format!(
                "No USD price for asset: {}",
                asset_id
            )));
        }

        Ok(RawQuote {
            symbol: asset_id.to_string(),
            price,
            change: coin.usd_24h_change.map(|pct| price * pct / 100.0),
            change_percent: coin.usd_24h_change,
            // The simple-price endpoint has no session OHLC; validation
            // substitutes the trade price.
            high: None,
            low: None,
            open: None,
            previous_close: None,
            volume: coin.usd_24h_vol,
            timestamp_ms: coin.last_updated_at.filter(|t| *t > 0).map(|t| t * 1000),
            source: PROVIDER_ID.to_string(),
        })
    }

    async fn get_candles(
        &self,
        asset_id: &str,
        _resolution: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<RawCandle>, MarketDataError> {
        let days = Self::days_param(from, to);

        match self.fetch_ohlc(asset_id, &days).await {
            Ok(candles) if !candles.is_empty() => return Ok(candles),
            Ok(_) => debug!("Empty OHLC series for {}, trying market chart", asset_id),
            Err(e) => warn!("OHLC fetch failed for {}: {}, trying market chart", asset_id, e),
        }

        let candles = self.fetch_market_chart(asset_id, &days).await?;
        if candles.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }

        Ok(candles)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_and_enablement() {
        let provider = CoinGeckoProvider::new();
        assert_eq!(provider.id(), "COINGECKO");
        assert_eq!(provider.priority(), 0);
        // Keyless API - always enabled
        assert!(provider.is_enabled());
    }

    #[test]
    fn test_simple_price_parsing() {
        let json = r#"{
            "bitcoin": {
                "usd": 55000.0,
                "usd_24h_change": 2.5,
                "usd_24h_vol": 28000000000.0,
                "last_updated_at": 1704067200
            }
        }"#;

        let response: HashMap<String, SimplePrice> = serde_json::from_str(json).unwrap();
        let coin = &response["bitcoin"];
        assert_eq!(coin.usd, Some(55000.0));
        assert_eq!(coin.usd_24h_change, Some(2.5));
        assert_eq!(coin.last_updated_at, Some(1_704_067_200));
    }

    #[test]
    fn test_days_param_snaps_to_valid_windows() {
        // 3 days of range -> smallest window that covers it is 7
        assert_eq!(CoinGeckoProvider::days_param(0, 3 * 86_400), "7");
        assert_eq!(CoinGeckoProvider::days_param(0, 86_400), "1");
        assert_eq!(CoinGeckoProvider::days_param(0, 200 * 86_400), "365");
        // Beyond the largest window -> "max"
        assert_eq!(CoinGeckoProvider::days_param(0, 1000 * 86_400), "max");
    }

    #[test]
    fn test_market_chart_parsing() {
        let json = r#"{"prices": [[1704067200000, 42000.5], [1704153600000, 42100.0]]}"#;
        let response: MarketChartResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.prices.len(), 2);
        assert_eq!(response.prices[0][1], 42000.5);
    }
}
