//! Market data provider trait definition.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{RawCandle, RawQuote};

use super::capabilities::{ProviderCapabilities, RateLimit};

/// Trait for market data providers.
///
/// Implement this trait to add a new upstream source. The aggregator
/// orders implementations by [`priority`](Self::priority), filters them by
/// [`capabilities`](Self::capabilities) and [`is_enabled`](Self::is_enabled),
/// and walks the resulting cascade until one returns a usable record -
/// adding a provider never means new branching logic in the cascade itself.
///
/// Providers receive pre-resolved, provider-native symbols; mapping from
/// the internal symbol happens in the resolver module. Providers decode
/// their own wire format and return the provider-agnostic [`RawQuote`] /
/// [`RawCandle`] shapes - canonical-layer code never sees upstream field
/// names.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier, a constant like "FINNHUB" or "POLYGON".
    /// Used for logging, rate limiting, and circuit breaker tracking.
    fn id(&self) -> &'static str;

    /// Cascade ordering. Lower values = tried earlier. Default 10.
    fn priority(&self) -> u8 {
        10
    }

    /// Whether the provider is configured (e.g. credentials present).
    /// Disabled providers are skipped by the cascade without logging an
    /// error. Default true for keyless providers.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Asset classes and operations this provider supports.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Rate limits to apply when calling this provider.
    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    /// Fetch the latest quote for a provider-native symbol.
    ///
    /// A non-positive upstream price must be reported as
    /// [`MarketDataError::SymbolNotFound`], never as a zero-price record.
    async fn get_quote(&self, symbol: &str) -> Result<RawQuote, MarketDataError>;

    /// Fetch historical candles for a provider-native symbol.
    ///
    /// `from`/`to` are epoch seconds (inclusive). The returned candles are
    /// ordered by time ascending. An empty range is reported as
    /// [`MarketDataError::NoDataForRange`].
    async fn get_candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<RawCandle>, MarketDataError>;
}
