//! Static symbol mapping tables.
//!
//! Two bidirectional tables, built once via `lazy_static`:
//! - internal crypto pair ("BTC-USD") <-> CoinGecko asset id ("bitcoin")
//! - internal futures code ("GC=F") <-> OANDA-routed code ("OANDA:XAU_USD")
//!
//! Lookups are pure. Commodity codes fall back to the internal symbol when
//! unmapped; crypto pairs without an id are simply not resolvable for the
//! CoinGecko route.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// Internal crypto pair -> CoinGecko asset id.
const CRYPTO_ASSET_IDS: &[(&str, &str)] = &[
    ("BTC-USD", "bitcoin"),
    ("ETH-USD", "ethereum"),
    ("BNB-USD", "binancecoin"),
    ("SOL-USD", "solana"),
    ("XRP-USD", "ripple"),
    ("ADA-USD", "cardano"),
    ("DOGE-USD", "dogecoin"),
    ("DOT-USD", "polkadot"),
    ("AVAX-USD", "avalanche-2"),
    ("LINK-USD", "chainlink"),
    ("MATIC-USD", "matic-network"),
    ("LTC-USD", "litecoin"),
    ("UNI-USD", "uniswap"),
    ("XLM-USD", "stellar"),
    ("ATOM-USD", "cosmos"),
    ("NEAR-USD", "near"),
    ("APT-USD", "aptos"),
    ("ARB-USD", "arbitrum"),
    ("OP-USD", "optimism"),
    ("AAVE-USD", "aave"),
    ("GRT-USD", "the-graph"),
    ("FIL-USD", "filecoin"),
    ("RNDR-USD", "render-token"),
    ("INJ-USD", "injective-protocol"),
    ("SUI-USD", "sui"),
    ("TON-USD", "the-open-network"),
    ("SHIB-USD", "shiba-inu"),
    ("PEPE-USD", "pepe"),
    ("ICP-USD", "internet-computer"),
    ("TRX-USD", "tron"),
];

/// Internal futures code -> exchange-routed commodity/metal code.
const EXCHANGE_CODES: &[(&str, &str)] = &[
    ("GC=F", "OANDA:XAU_USD"),
    ("SI=F", "OANDA:XAG_USD"),
    ("PL=F", "OANDA:XPT_USD"),
    ("PA=F", "OANDA:XPD_USD"),
    ("HG=F", "OANDA:XCU_USD"),
    ("CL=F", "OANDA:BCO_USD"),
    ("NG=F", "OANDA:NATGAS_USD"),
    ("ZC=F", "OANDA:CORN_USD"),
    ("ZW=F", "OANDA:WHEAT_USD"),
    ("ZS=F", "OANDA:SOYBN_USD"),
    ("KC=F", "OANDA:COFFEE_USD"),
    ("CT=F", "OANDA:COTTON_USD"),
    ("SB=F", "OANDA:SUGAR_USD"),
    ("CC=F", "OANDA:COCOA_USD"),
];

lazy_static! {
    static ref CRYPTO_FORWARD: HashMap<&'static str, &'static str> =
        CRYPTO_ASSET_IDS.iter().copied().collect();
    static ref CRYPTO_REVERSE: HashMap<&'static str, &'static str> =
        CRYPTO_ASSET_IDS.iter().map(|(sym, id)| (*id, *sym)).collect();
    static ref EXCHANGE_FORWARD: HashMap<&'static str, &'static str> =
        EXCHANGE_CODES.iter().copied().collect();
    static ref EXCHANGE_REVERSE: HashMap<&'static str, &'static str> =
        EXCHANGE_CODES.iter().map(|(sym, code)| (*code, *sym)).collect();
}

/// CoinGecko asset id for an internal crypto pair, if one is mapped.
pub fn crypto_asset_id(symbol: &str) -> Option<&'static str> {
    CRYPTO_FORWARD.get(symbol).copied()
}

/// Internal crypto pair for a CoinGecko asset id.
pub fn symbol_for_crypto_asset_id(asset_id: &str) -> Option<&'static str> {
    CRYPTO_REVERSE.get(asset_id).copied()
}

/// Exchange-routed code for an internal futures symbol, if one is mapped.
pub fn exchange_code(symbol: &str) -> Option<&'static str> {
    EXCHANGE_FORWARD.get(symbol).copied()
}

/// Internal futures symbol for an exchange-routed code.
pub fn symbol_for_exchange_code(code: &str) -> Option<&'static str> {
    EXCHANGE_REVERSE.get(code).copied()
}
