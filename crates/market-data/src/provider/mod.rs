//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Provider capabilities and rate limiting configuration
//! - Concrete provider implementations (Finnhub, Polygon, Alpha Vantage,
//!   CoinGecko)
//!
//! Providers receive pre-resolved provider-native symbols. The mapping
//! from the internal symbol happens in the resolver module, not in the
//! providers themselves.

mod capabilities;
mod traits;

pub mod alpha_vantage;
pub mod coingecko;
pub mod finnhub;
pub mod polygon;

pub use capabilities::{ProviderCapabilities, RateLimit};
pub use traits::MarketDataProvider;
