use crate::models::{AssetClass, ProviderId, ProviderSymbol};

/// Maps an internal symbol to a provider-native symbol.
///
/// Resolution is pure and infallible in the error sense: `None` means
/// "this provider has no way to address this instrument" and the cascade
/// moves on to the next provider. It is never a caller-visible failure.
pub trait SymbolResolver: Send + Sync {
    fn resolve(
        &self,
        provider: ProviderId,
        symbol: &str,
        class: AssetClass,
    ) -> Option<ProviderSymbol>;
}
