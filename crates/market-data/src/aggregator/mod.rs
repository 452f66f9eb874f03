//! The aggregation service and its orchestration components:
//! - The aggregator itself (classification, cache, dedup, fallback cascade)
//! - Per-provider rate limiting
//! - Per-provider circuit breaking
//! - Quote and candle validation

mod circuit_breaker;
mod rate_limiter;
mod service;
mod validator;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::RateLimiter;
pub use service::{
    AggregatorSettings, MarketDataAggregator, DEFAULT_CANDLE_TTL, DEFAULT_QUOTE_TTL,
};
pub use validator::QuoteValidator;
