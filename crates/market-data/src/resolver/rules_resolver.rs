//! Deterministic symbol resolution rules.

use crate::models::{AssetClass, ProviderId, ProviderSymbol};

use super::symbol_maps::{crypto_asset_id, exchange_code};
use super::traits::SymbolResolver;

/// Rules-based resolver covering the standard provider set.
///
/// | Provider | Stock | Crypto | Commodity |
/// |----------|-------|--------|-----------|
/// | COINGECKO | - | asset id table (unmapped = unresolvable) | - |
/// | FINNHUB | identity | `BINANCE:{base}USDT` | exchange table, identity fallback |
/// | POLYGON / ALPHA_VANTAGE | identity | - | - |
///
/// Unknown providers get the internal symbol unchanged, which keeps the
/// identity fallback of the mapping contract and lets purpose-built
/// providers opt out via their declared capabilities instead.
#[derive(Debug, Default)]
pub struct RulesResolver;

impl RulesResolver {
    pub fn new() -> Self {
        Self
    }

    /// Exchange-routed crypto symbol for the primary provider:
    /// "BTC-USD" -> "BINANCE:BTCUSDT".
    fn binance_symbol(symbol: &str) -> ProviderSymbol {
        let base = symbol.strip_suffix("-USD").unwrap_or(symbol);
        format!("BINANCE:{}USDT", base)
    }
}

impl SymbolResolver for RulesResolver {
    fn resolve(
        &self,
        provider: ProviderId,
        symbol: &str,
        class: AssetClass,
    ) -> Option<ProviderSymbol> {
        match (provider, class) {
            // CoinGecko speaks asset ids only; an unmapped pair makes the
            // provider unresolvable and the cascade skips it.
            ("COINGECKO", AssetClass::Crypto) => crypto_asset_id(symbol).map(str::to_string),
            ("COINGECKO", _) => None,

            ("FINNHUB", AssetClass::Crypto) => Some(Self::binance_symbol(symbol)),
            ("FINNHUB", AssetClass::Commodity) => Some(
                exchange_code(symbol)
                    .map(str::to_string)
                    .unwrap_or_else(|| symbol.to_string()),
            ),
            ("FINNHUB", AssetClass::Stock) => Some(symbol.to_string()),

            ("POLYGON" | "ALPHA_VANTAGE", AssetClass::Stock) => Some(symbol.to_string()),
            ("POLYGON" | "ALPHA_VANTAGE", _) => None,

            // Unmapped-identity fallback for any other provider.
            _ => Some(symbol.to_string()),
        }
    }
}
