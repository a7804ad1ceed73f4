//! Token buckets throttling login attempts.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    updated: Instant,
}

/// One bucket per key (email or client address). Each attempt takes a
/// token; buckets refill linearly to `capacity` over `window`.
#[derive(Debug)]
pub struct LoginRateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        let capacity = f64::from(max_attempts.max(1));
        let window_secs = window.as_secs_f64().max(1.0);
        Self {
            capacity,
            refill_per_sec: capacity / window_secs,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Takes one token from every key's bucket. Returns `false`, taking
    /// nothing, when any bucket is empty.
    pub fn try_acquire(&self, keys: &[&str]) -> bool {
        self.try_acquire_at(keys, Instant::now())
    }

    fn try_acquire_at(&self, keys: &[&str], now: Instant) -> bool {
        let Ok(mut buckets) = self.buckets.lock() else {
            return false;
        };
        let mut refilled = Vec::with_capacity(keys.len());
        for key in keys {
            let bucket = match buckets.get(*key) {
                Some(b) => self.refill(*b, now),
                None => Bucket {
                    tokens: self.capacity,
                    updated: now,
                },
            };
            if bucket.tokens < 1.0 {
                return false;
            }
            refilled.push(((*key).to_string(), bucket));
        }
        for (key, mut bucket) in refilled {
            bucket.tokens -= 1.0;
            buckets.insert(key, bucket);
        }
        if buckets.len() > 10_000 {
            let capacity = self.capacity;
            buckets.retain(|_, b| self.refill(*b, now).tokens < capacity);
        }
        true
    }

    /// Forgets a key, e.g. after a successful login.
    pub fn reset(&self, key: &str) {
        if let Ok(mut buckets) = self.buckets.lock() {
            buckets.remove(key);
        }
    }

    fn refill(&self, bucket: Bucket, now: Instant) -> Bucket {
        let elapsed = now.saturating_duration_since(bucket.updated).as_secs_f64();
        Bucket {
            tokens: (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity),
            updated: now,
        }
    }
}
