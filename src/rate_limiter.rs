//! Minimum-interval pacing between catalog API calls.
//!
//! The synchronizer is strictly sequential, so a single limiter in front of
//! the client is enough to stay polite.  Pacing only — a failed call is
//! never retried here.

use std::thread;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        RateLimiter {
            interval,
            last_request: None,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Sleep until `interval` has passed since the previous call.
    /// Must be called *before* issuing a request.
    pub fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enforces_minimum_interval() {
        let mut limiter = RateLimiter::from_millis(30);
        let start = Instant::now();
        limiter.wait_if_needed(); // first call never waits
        limiter.wait_if_needed();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
