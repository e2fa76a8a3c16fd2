use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Decides whether another attempt under `key` is allowed, and records it if so
pub trait RateLimiter: Send + Sync {
    fn check_and_record(&self, key: &str, now: DateTime<Utc>) -> bool;
}

/// Sliding-window limiter held in process memory.
///
/// State is lost on restart, so this is a deterrent rather than a security
/// boundary. Keys whose attempts have all aged out are evicted.
pub struct InMemoryRateLimiter {
    max_attempts: usize,
    window: Duration,
    attempts: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check_and_record(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let cutoff = now - self.window;

        // TTL eviction across all keys
        attempts.retain(|_, times| {
            while times.front().is_some_and(|t| *t <= cutoff) {
                times.pop_front();
            }
            !times.is_empty()
        });

        let times = attempts.entry(key.to_string()).or_default();
        if times.len() >= self.max_attempts {
            return false;
        }
        times.push_back(now);
        true
    }
}
