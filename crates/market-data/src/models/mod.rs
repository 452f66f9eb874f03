//! Market data models
//!
//! Core data types for the aggregation layer:
//! - `types` - type aliases for common identifiers (ProviderId, ProviderSymbol)
//! - `instrument` - asset classification from symbol syntax (AssetClass)
//! - `quote` - canonical and raw quote shapes (Quote, RawQuote)
//! - `candle` - canonical and raw OHLCV shapes (Candle, RawCandle)

mod candle;
mod instrument;
mod quote;
mod types;

pub use candle::{Candle, RawCandle};
pub use instrument::AssetClass;
pub use quote::{Quote, RawQuote};
pub use types::{ProviderId, ProviderSymbol};
