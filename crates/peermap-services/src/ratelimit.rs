//! Call rate limiting — one token bucket per caller address.
//!
//! Each page call costs 1 token. Buckets start full at `burst` and refill
//! at `calls_per_second`. Empty bucket = reject.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use peermap_core::config::RateLimitConfig;

/// Buckets untouched for this long are dropped by [`CallRateLimiter::prune`].
const IDLE_BUCKET_TTL: Duration = Duration::from_secs(600);

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    /// Take `cost` tokens if available.
    fn allow(&mut self, cost: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }
}

/// Per-caller limiter shared by all API handlers.
#[derive(Clone)]
pub struct CallRateLimiter {
    buckets: Arc<DashMap<IpAddr, TokenBucket>>,
    enabled: bool,
    burst: f64,
    calls_per_second: f64,
}

impl CallRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            enabled: config.enabled,
            burst: config.burst,
            calls_per_second: config.calls_per_second,
        }
    }

    /// A limiter that allows everything.
    pub fn disabled() -> Self {
        Self::new(&RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        })
    }

    /// Charge `cost` calls to `caller`. Returns false if the caller is over
    /// its limit.
    pub fn check(&self, caller: IpAddr, cost: u32) -> bool {
        if !self.enabled {
            return true;
        }
        let allowed = self
            .buckets
            .entry(caller)
            .or_insert_with(|| TokenBucket::new(self.burst, self.calls_per_second))
            .allow(f64::from(cost));
        if !allowed {
            tracing::debug!(%caller, "call rate limit exceeded");
        }
        allowed
    }

    /// Drop buckets that have been idle long enough to be full again.
    pub fn prune(&self) {
        self.buckets
            .retain(|_, bucket| bucket.last_refill.elapsed() < IDLE_BUCKET_TTL);
    }

    pub fn tracked_callers(&self) -> usize {
        self.buckets.len()
    }
}
