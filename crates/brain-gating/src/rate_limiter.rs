//! `QualityRateLimiter`: a sliding-window limiter protecting the quality
//! (cloud) tier from abuse (spec §4.8), grounded on
//! `quality_gating.py`'s `QualityRateLimiter`.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rate-limiter statistics (spec §4.8 `get_stats`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterStats {
    /// Requests currently counted in the window.
    pub current_usage: u32,
    /// Configured ceiling.
    pub max_requests: u32,
    /// `max_requests - current_usage`, floored at 0.
    pub remaining_quota: u32,
    /// Total `acquire()` calls denied since the last reset.
    pub blocked_count: u64,
    /// Total `acquire()` calls made since the last reset.
    pub total_requests: u64,
    /// `blocked_count / max(1, total_requests)`.
    pub block_rate: f64,
}

struct State {
    requests: VecDeque<Instant>,
    blocked_count: u64,
    total_requests: u64,
}

/// Thread-safe sliding-window rate limiter for the quality tier.
pub struct QualityRateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<State>,
}

impl QualityRateLimiter {
    /// Build a limiter allowing `max_requests` per `window_seconds`.
    #[must_use]
    pub fn new(max_requests: u32, window_seconds: f64) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window: Duration::from_secs_f64(window_seconds.max(0.001)),
            state: Mutex::new(State { requests: VecDeque::new(), blocked_count: 0, total_requests: 0 }),
        }
    }

    fn cleanup(requests: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(&front) = requests.front() {
            if now.duration_since(front) > window {
                requests.pop_front();
            } else {
                break;
            }
        }
    }

    /// Whether a request would currently be allowed, without consuming quota.
    #[must_use]
    pub fn check(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Self::cleanup(&mut state.requests, Instant::now(), self.window);
        state.requests.len() < self.max_requests as usize
    }

    /// Attempt to consume one slot. Returns whether it was granted.
    pub fn acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();
        Self::cleanup(&mut state.requests, now, self.window);
        state.total_requests += 1;

        if state.requests.len() >= self.max_requests as usize {
            state.blocked_count += 1;
            tracing::warn!(
                current = state.requests.len(),
                max = self.max_requests,
                "quality rate limiter denied request"
            );
            return false;
        }
        state.requests.push_back(now);
        true
    }

    /// Release one previously acquired slot (error-recovery path).
    pub fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.requests.pop_back();
    }

    /// Current usage/blocked/total snapshot.
    #[must_use]
    pub fn stats(&self) -> RateLimiterStats {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Self::cleanup(&mut state.requests, Instant::now(), self.window);
        let current_usage = state.requests.len() as u32;
        RateLimiterStats {
            current_usage,
            max_requests: self.max_requests,
            remaining_quota: self.max_requests.saturating_sub(current_usage),
            blocked_count: state.blocked_count,
            total_requests: state.total_requests,
            block_rate: (state.blocked_count as f64 / state.total_requests.max(1) as f64 * 1000.0).round() / 1000.0,
        }
    }

    /// Clear all counters and the request window.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.requests.clear();
        state.blocked_count = 0;
        state.total_requests = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_requests_then_blocks() {
        let limiter = QualityRateLimiter::new(2, 60.0);
        assert!(limiter.acquire());
        assert!(limiter.acquire());
        assert!(!limiter.acquire());
        assert_eq!(limiter.stats().blocked_count, 1);
    }

    #[test]
    fn release_frees_a_slot() {
        let limiter = QualityRateLimiter::new(1, 60.0);
        assert!(limiter.acquire());
        limiter.release();
        assert!(limiter.acquire());
    }

    #[test]
    fn window_expiry_frees_capacity() {
        let limiter = QualityRateLimiter::new(1, 0.05);
        assert!(limiter.acquire());
        std::thread::sleep(Duration::from_millis(80));
        assert!(limiter.acquire());
    }

    #[test]
    fn reset_clears_counters() {
        let limiter = QualityRateLimiter::new(1, 60.0);
        limiter.acquire();
        limiter.acquire();
        limiter.reset();
        let stats = limiter.stats();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.blocked_count, 0);
    }
}
