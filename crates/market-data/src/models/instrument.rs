use serde::{Deserialize, Serialize};

/// Asset classification, derived from symbol syntax.
///
/// The internal symbol convention follows the common chart-feed format:
/// crypto pairs carry a `-USD` suffix ("BTC-USD"), futures contracts for
/// commodities and metals carry an `=F` marker ("GC=F"), and everything
/// else is treated as an exchange-listed stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    Stock,
    Crypto,
    Commodity,
}

impl AssetClass {
    /// Classify an internal symbol. Total - every string maps to a class.
    pub fn of(symbol: &str) -> Self {
        if symbol.ends_with("-USD") && !symbol.contains('=') {
            Self::Crypto
        } else if symbol.contains("=F") {
            Self::Commodity
        } else {
            Self::Stock
        }
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stock => write!(f, "stock"),
            Self::Crypto => write!(f, "crypto"),
            Self::Commodity => write!(f, "commodity"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_pair_suffix() {
        assert_eq!(AssetClass::of("BTC-USD"), AssetClass::Crypto);
        assert_eq!(AssetClass::of("SOL-USD"), AssetClass::Crypto);
    }

    #[test]
    fn test_futures_marker() {
        assert_eq!(AssetClass::of("GC=F"), AssetClass::Commodity);
        assert_eq!(AssetClass::of("CL=F"), AssetClass::Commodity);
    }

    #[test]
    fn test_plain_ticker_is_stock() {
        assert_eq!(AssetClass::of("AAPL"), AssetClass::Stock);
        assert_eq!(AssetClass::of("BRK.B"), AssetClass::Stock);
    }

    #[test]
    fn test_futures_marker_wins_over_pair_suffix() {
        // A contrived symbol carrying both markers is a futures contract,
        // not a crypto pair.
        assert_eq!(AssetClass::of("XX=F-USD"), AssetClass::Commodity);
    }

    #[test]
    fn test_unknown_symbol_is_stock() {
        assert_eq!(AssetClass::of(""), AssetClass::Stock);
        assert_eq!(AssetClass::of("???"), AssetClass::Stock);
    }
}
