//! Symbol resolution for market data providers.
//!
//! Converts internal symbols ("BTC-USD", "GC=F", "AAPL") to the symbol a
//! given provider actually understands ("bitcoin", "OANDA:XAU_USD",
//! "AAPL"). Resolution happens once per provider attempt inside the
//! cascade; providers never see internal symbols.
//!
//! `None` from a resolver means the provider cannot address the
//! instrument at all - the cascade logs it and moves on, it is never an
//! error.

mod rules_resolver;
mod symbol_maps;
mod traits;

pub use rules_resolver::RulesResolver;
pub use symbol_maps::{
    crypto_asset_id, exchange_code, symbol_for_crypto_asset_id, symbol_for_exchange_code,
};
pub use traits::SymbolResolver;
