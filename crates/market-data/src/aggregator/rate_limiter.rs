//! Per-provider token bucket rate limiting.
//!
//! Each provider gets its own bucket, seeded from the provider's declared
//! [`RateLimit`](crate::provider::RateLimit). Buckets refill continuously
//! at `requests_per_minute / 60` tokens per second up to the burst
//! capacity.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::models::ProviderId;
use crate::provider::RateLimit;

/// Token bucket for a single provider.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Refill rate in tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(limit: RateLimit) -> Self {
        let capacity = f64::from(limit.burst.max(1));
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(limit.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Token bucket rate limiter covering all registered providers.
///
/// Buckets are created on first use from the configured limits, or with
/// the default [`RateLimit`] for providers that never got one.
pub struct RateLimiter {
    buckets: Mutex<HashMap<ProviderId, TokenBucket>>,
    limits: Mutex<HashMap<ProviderId, RateLimit>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            limits: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the buckets, recovering from poison if necessary.
    ///
    /// Worst case after recovery is slightly off rate accounting, which
    /// beats panicking mid-request.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<ProviderId, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_limits(&self) -> MutexGuard<'_, HashMap<ProviderId, RateLimit>> {
        self.limits.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter limits mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Set the limit for a provider, resetting any existing bucket.
    pub fn configure(&self, provider: ProviderId, limit: RateLimit) {
        self.lock_limits().insert(provider, limit);
        self.lock_buckets().remove(provider);
    }

    /// Acquire a token for the provider, sleeping until one is available.
    pub async fn acquire(&self, provider: ProviderId) {
        loop {
            let wait = {
                let limit = self
                    .lock_limits()
                    .get(provider)
                    .copied()
                    .unwrap_or_default();
                let mut buckets = self.lock_buckets();
                let bucket = buckets
                    .entry(provider)
                    .or_insert_with(|| TokenBucket::new(limit));

                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };

            debug!("Rate limiter: waiting {:?} for '{}'", wait, provider);
            tokio::time::sleep(wait).await;
        }
    }

    /// Acquire a token without waiting. Returns false when throttled.
    pub fn try_acquire(&self, provider: ProviderId) -> bool {
        let limit = self
            .lock_limits()
            .get(provider)
            .copied()
            .unwrap_or_default();
        let mut buckets = self.lock_buckets();
        buckets
            .entry(provider)
            .or_insert_with(|| TokenBucket::new(limit))
            .try_acquire()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_throttle() {
        let limiter = RateLimiter::new();
        limiter.configure(
            "TEST",
            RateLimit {
                requests_per_minute: 60,
                burst: 3,
            },
        );

        assert!(limiter.try_acquire("TEST"));
        assert!(limiter.try_acquire("TEST"));
        assert!(limiter.try_acquire("TEST"));
        assert!(!limiter.try_acquire("TEST"));
    }

    #[test]
    fn test_unconfigured_provider_gets_default_limit() {
        let limiter = RateLimiter::new();
        let default_burst = RateLimit::default().burst;

        for _ in 0..default_burst {
            assert!(limiter.try_acquire("FRESH"));
        }
        assert!(!limiter.try_acquire("FRESH"));
    }

    #[test]
    fn test_providers_are_isolated() {
        let limiter = RateLimiter::new();
        limiter.configure(
            "A",
            RateLimit {
                requests_per_minute: 60,
                burst: 1,
            },
        );

        assert!(limiter.try_acquire("A"));
        assert!(!limiter.try_acquire("A"));
        assert!(limiter.try_acquire("B"));
    }

    #[test]
    fn test_bucket_refills_over_time() {
        let mut bucket = TokenBucket::new(RateLimit {
            requests_per_minute: 60,
            burst: 1,
        });

        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());

        // Simulate two seconds of elapsed time at 1 token/second.
        bucket.last_update = Instant::now() - Duration::from_secs(2);
        assert!(bucket.try_acquire());
    }

    #[tokio::test]
    async fn test_async_acquire_waits_for_refill() {
        let limiter = RateLimiter::new();
        limiter.configure(
            "ASYNC",
            RateLimit {
                requests_per_minute: 6000, // 100/second for a fast test
                burst: 1,
            },
        );

        limiter.acquire("ASYNC").await;

        let start = Instant::now();
        limiter.acquire("ASYNC").await;
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
