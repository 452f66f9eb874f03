//! Per-provider circuit breaker.
//!
//! Keeps a persistently failing provider out of the cascade instead of
//! burning a timeout on it for every request. Three states:
//!
//! - **Closed**: normal operation, requests allowed
//! - **Open**: provider is failing, requests blocked
//! - **HalfOpen**: recovery probe, limited requests allowed
//!
//! State is in-memory and resets on restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::models::ProviderId;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_HALF_OPEN_SUCCESSES: u32 = 2;

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    failure_count: u32,
    half_open_successes: u32,
    last_failure: Option<Instant>,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            half_open_successes: 0,
            last_failure: None,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit waits before probing recovery.
    pub recovery_timeout: Duration,
    /// Successes needed in HalfOpen to close the circuit again.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_success_threshold: DEFAULT_HALF_OPEN_SUCCESSES,
        }
    }
}

/// Per-provider circuit breaker.
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<ProviderId, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Lock the circuits, recovering from poison if necessary.
    ///
    /// Worst case after recovery is slightly off circuit state, which
    /// beats panicking mid-request.
    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<ProviderId, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether a request to this provider is currently allowed.
    ///
    /// Also handles the Open -> HalfOpen transition once the recovery
    /// timeout has elapsed.
    pub fn is_allowed(&self, provider: ProviderId) -> bool {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(provider).or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                if let Some(last_failure) = circuit.last_failure {
                    if last_failure.elapsed() >= self.config.recovery_timeout {
                        info!("Circuit breaker: '{}' Open -> HalfOpen", provider);
                        circuit.state = CircuitState::HalfOpen;
                        circuit.half_open_successes = 0;
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Record a successful request.
    pub fn record_success(&self, provider: ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(provider).or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed => {
                circuit.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                circuit.half_open_successes += 1;
                if circuit.half_open_successes >= self.config.half_open_success_threshold {
                    info!(
                        "Circuit breaker: closing '{}' after {} successes",
                        provider, circuit.half_open_successes
                    );
                    *circuit = Circuit::new();
                }
            }
            CircuitState::Open => {
                debug!("Circuit breaker: success for '{}' while Open", provider);
            }
        }
    }

    /// Record a failed request. Any failure in HalfOpen reopens the
    /// circuit immediately.
    pub fn record_failure(&self, provider: ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(provider).or_insert_with(Circuit::new);

        circuit.failure_count += 1;
        circuit.last_failure = Some(Instant::now());

        match circuit.state {
            CircuitState::Closed => {
                if circuit.failure_count >= self.config.failure_threshold {
                    info!(
                        "Circuit breaker: opening '{}' after {} failures",
                        provider, circuit.failure_count
                    );
                    circuit.state = CircuitState::Open;
                } else {
                    debug!(
                        "Circuit breaker: failure for '{}' ({}/{})",
                        provider, circuit.failure_count, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                info!("Circuit breaker: reopening '{}' after HalfOpen failure", provider);
                circuit.state = CircuitState::Open;
                circuit.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Current state for a provider.
    pub fn state(&self, provider: ProviderId) -> CircuitState {
        self.lock_circuits()
            .get(provider)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Manually reset a provider's circuit to Closed.
    pub fn reset(&self, provider: ProviderId) {
        if let Some(circuit) = self.lock_circuits().get_mut(provider) {
            *circuit = Circuit::new();
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            recovery_timeout: Duration::from_millis(10),
            half_open_success_threshold: 2,
        }
    }

    #[test]
    fn test_starts_closed() {
        let cb = CircuitBreaker::new();
        assert!(cb.is_allowed("TEST"));
        assert_eq!(cb.state("TEST"), CircuitState::Closed);
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = CircuitBreaker::with_config(fast_config(3));

        cb.record_failure("FLAKY");
        cb.record_failure("FLAKY");
        assert!(cb.is_allowed("FLAKY"));

        cb.record_failure("FLAKY");
        assert!(!cb.is_allowed("FLAKY"));
        assert_eq!(cb.state("FLAKY"), CircuitState::Open);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = CircuitBreaker::with_config(fast_config(3));

        cb.record_failure("FLAKY");
        cb.record_failure("FLAKY");
        cb.record_success("FLAKY");
        cb.record_failure("FLAKY");
        cb.record_failure("FLAKY");

        // Never hit three consecutive failures.
        assert_eq!(cb.state("FLAKY"), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_after_recovery_timeout() {
        let cb = CircuitBreaker::with_config(fast_config(1));

        cb.record_failure("DOWN");
        assert!(!cb.is_allowed("DOWN"));

        std::thread::sleep(Duration::from_millis(20));

        assert!(cb.is_allowed("DOWN"));
        assert_eq!(cb.state("DOWN"), CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_closes_after_enough_successes() {
        let cb = CircuitBreaker::with_config(fast_config(1));

        cb.record_failure("HEALING");
        std::thread::sleep(Duration::from_millis(20));
        cb.is_allowed("HEALING");

        cb.record_success("HEALING");
        assert_eq!(cb.state("HEALING"), CircuitState::HalfOpen);

        cb.record_success("HEALING");
        assert_eq!(cb.state("HEALING"), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_reopens_on_failure() {
        let cb = CircuitBreaker::with_config(fast_config(1));

        cb.record_failure("RELAPSE");
        std::thread::sleep(Duration::from_millis(20));
        cb.is_allowed("RELAPSE");
        assert_eq!(cb.state("RELAPSE"), CircuitState::HalfOpen);

        cb.record_failure("RELAPSE");
        assert_eq!(cb.state("RELAPSE"), CircuitState::Open);
    }

    #[test]
    fn test_providers_are_isolated() {
        let cb = CircuitBreaker::with_config(fast_config(1));

        cb.record_failure("A");
        assert!(!cb.is_allowed("A"));
        assert!(cb.is_allowed("B"));
    }

    #[test]
    fn test_manual_reset() {
        let cb = CircuitBreaker::with_config(fast_config(1));

        cb.record_failure("STUCK");
        assert_eq!(cb.state("STUCK"), CircuitState::Open);

        cb.reset("STUCK");
        assert_eq!(cb.state("STUCK"), CircuitState::Closed);
        assert!(cb.is_allowed("STUCK"));
    }
}
