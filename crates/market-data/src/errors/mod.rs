//! Error types and failover classification.
//!
//! - [`MarketDataError`]: the error enum for all provider operations
//! - [`ValidationError`]: a field-level validation failure
//! - [`RetryClass`]: classification driving the cascade's penalty decisions

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// A single field that failed validation, with the offending value.
#[derive(Clone, Debug, Error)]
#[error("invalid field '{field}': {reason} (got {value})")]
pub struct ValidationError {
    /// The offending field, e.g. "price" or "candles[3].close"
    pub field: String,
    /// The offending value, rendered for logging
    pub value: String,
    /// What the field was expected to be
    pub reason: &'static str,
}

impl ValidationError {
    pub(crate) fn new(field: impl Into<String>, value: impl ToString, reason: &'static str) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
            reason,
        }
    }
}

/// Errors that can occur while fetching market data from a provider.
///
/// Every variant is classified via [`retry_class`](Self::retry_class),
/// which tells the cascade whether the failing provider should take a
/// circuit breaker penalty before the next provider is tried.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider does not know the symbol, or reported its failure
    /// sentinel for it (e.g. a zero price for an unknown ticker).
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider does not serve this class of instrument.
    #[error("Unsupported asset class: {0}")]
    UnsupportedAssetClass(String),

    /// The symbol exists but has no candles in the requested range.
    #[error("No data for date range")]
    NoDataForRange,

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// Any other provider-specific failure (non-2xx, malformed payload).
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// The provider returned data that failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A transport-level error while talking to a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the failover classification for this error.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // The request was bad or unanswerable - no penalty
            Self::SymbolNotFound(_)
            | Self::UnsupportedAssetClass(_)
            | Self::NoDataForRange
            | Self::Validation(_) => RetryClass::Never,

            // Transient faults - penalize so the circuit can open
            Self::RateLimited { .. } | Self::Timeout { .. } => RetryClass::FailoverWithPenalty,

            // This provider can't serve the request, another might
            Self::ProviderError { .. } | Self::Network(_) => RetryClass::NextProvider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_never_penalized() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_unsupported_asset_class_never_penalized() {
        let error = MarketDataError::UnsupportedAssetClass("commodity".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_rate_limited_takes_penalty() {
        let error = MarketDataError::RateLimited {
            provider: "FINNHUB".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    }

    #[test]
    fn test_timeout_takes_penalty() {
        let error = MarketDataError::Timeout {
            provider: "ALPHA_VANTAGE".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    }

    #[test]
    fn test_provider_error_tries_next() {
        let error = MarketDataError::ProviderError {
            provider: "POLYGON".to_string(),
            message: "Internal server error".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_validation_error_never_penalized() {
        let error = MarketDataError::Validation(ValidationError::new(
            "price",
            -5,
            "expected positive number",
        ));
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_validation_error_names_field_and_value() {
        let error = ValidationError::new("price", -5, "expected positive number");
        let message = format!("{}", error);
        assert!(message.contains("price"));
        assert!(message.contains("-5"));
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::ProviderError {
            provider: "ALPHA_VANTAGE".to_string(),
            message: "API key invalid".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider error: ALPHA_VANTAGE - API key invalid"
        );
    }
}
