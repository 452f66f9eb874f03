/// Classification for failover policy.
///
/// Determines how the aggregator cascade responds to a provider error.
/// The cascade always moves on to the next provider - failures are never
/// surfaced to callers - so the classification only controls whether the
/// failing provider takes a circuit breaker penalty.
///
/// | Class | Circuit breaker penalty? |
/// |-------|--------------------------|
/// | `Never` | No - the request itself was bad, the provider is healthy |
/// | `FailoverWithPenalty` | Yes - transient fault, back the provider off |
/// | `NextProvider` | No - this provider simply cannot serve the request |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Bad symbol, no data, or validation failure. Retrying the same
    /// provider won't help, but it did nothing wrong either.
    Never,

    /// Transient fault such as rate limiting (429) or a timeout.
    ///
    /// The failure is recorded in the circuit breaker; enough of these in
    /// a row open the circuit and the provider is temporarily excluded
    /// from the cascade.
    FailoverWithPenalty,

    /// The provider can't handle this request (unsupported asset class,
    /// malformed payload) but another provider might.
    NextProvider,
}
