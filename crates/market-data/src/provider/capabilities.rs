//! Provider capabilities and rate limiting configuration.

use crate::models::AssetClass;

/// Describes what a market data provider can do.
///
/// The aggregator uses this to decide which providers participate in the
/// fallback cascade for a given symbol and operation.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Asset classes this provider serves.
    pub asset_classes: &'static [AssetClass],

    /// Whether the provider can serve real-time quotes.
    pub supports_quotes: bool,

    /// Whether the provider can serve historical candles.
    pub supports_candles: bool,
}

/// Rate limiting configuration for a provider.
///
/// Controls how aggressively the provider is called, to stay inside its
/// published quota.
#[derive(Clone, Copy, Debug)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Burst capacity - requests allowed back-to-back before throttling.
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 10,
        }
    }
}
