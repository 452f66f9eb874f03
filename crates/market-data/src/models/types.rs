/// Provider identifier - always a static constant like "FINNHUB"
pub type ProviderId = &'static str;

/// Provider-specific symbol produced by the resolver (e.g. "BINANCE:BTCUSDT")
pub type ProviderSymbol = String;
