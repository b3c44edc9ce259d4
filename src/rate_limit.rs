use dashmap::DashMap;
use std::time::{Duration, Instant};

// Rate bucket - tracks requests per client key within one fixed window
struct RateBucket {
    count: u32,
    window_start: Instant,
}

/// Outcome of a rate-limit check, reported back to the caller via the
/// x-ratelimit-* response headers.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
}

/// Fixed-window request counter, process-local.
///
/// Each gateway instance keeps its own buckets, so the effective global
/// limit across N replicas can reach N times the configured value. The
/// type is the seam to later swap in a shared counter without touching
/// the middleware.
pub struct RateLimiter {
    buckets: DashMap<String, RateBucket>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one request against `key` and decide whether to admit it.
    ///
    /// The DashMap entry API holds the shard lock across the whole
    /// read-check-increment, so two concurrent requests cannot both observe
    /// a stale count.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();

        let mut entry = self
            .buckets
            .entry(key.to_string())
            .or_insert(RateBucket {
                count: 0,
                window_start: now,
            });

        // Window expired? Replace the bucket instead of incrementing
        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 1;
            entry.window_start = now;
            return RateLimitDecision {
                allowed: true,
                remaining: self.limit.saturating_sub(1),
            };
        }

        if entry.count < self.limit {
            entry.count += 1;
            return RateLimitDecision {
                allowed: true,
                remaining: self.limit - entry.count,
            };
        }

        RateLimitDecision {
            allowed: false,
            remaining: 0,
        }
    }

    /// Remaining quota for `key` without counting a request. Used for the
    /// telemetry headers on responses that never reach the limiter (401s).
    pub fn peek(&self, key: &str) -> u32 {
        match self.buckets.get(key) {
            Some(entry) if entry.window_start.elapsed() < self.window => {
                self.limit.saturating_sub(entry.count)
            }
            _ => self.limit,
        }
    }

    /// Drop buckets whose window has passed. Called from a background task
    /// so an idle key doesn't pin memory for the life of the process.
    pub fn sweep_expired(&self) {
        let window = self.window;
        self.buckets
            .retain(|_, bucket| bucket.window_start.elapsed() < window);
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("secret|1.2.3.4");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let rejected = limiter.check("secret|1.2.3.4");
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
    }

    #[test]
    fn expired_window_resets_instead_of_incrementing() {
        let limiter = RateLimiter::new(3, Duration::from_millis(50));

        for _ in 0..3 {
            assert!(limiter.check("k").allowed);
        }
        assert!(!limiter.check("k").allowed);

        std::thread::sleep(Duration::from_millis(60));

        // Fresh window admits again, counting from 1
        let decision = limiter.check("k");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("secret|10.0.0.1").allowed);
        assert!(!limiter.check("secret|10.0.0.1").allowed);
        assert!(limiter.check("secret|10.0.0.2").allowed);
    }

    #[test]
    fn peek_does_not_consume_quota() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert_eq!(limiter.peek("k"), 2);
        limiter.check("k");
        assert_eq!(limiter.peek("k"), 1);
        assert_eq!(limiter.peek("k"), 1);
    }

    #[test]
    fn sweep_removes_expired_buckets() {
        let limiter = RateLimiter::new(5, Duration::from_millis(20));

        limiter.check("a");
        limiter.check("b");
        assert_eq!(limiter.bucket_count(), 2);

        std::thread::sleep(Duration::from_millis(30));
        limiter.check("c");
        limiter.sweep_expired();

        assert_eq!(limiter.bucket_count(), 1);
    }
}
