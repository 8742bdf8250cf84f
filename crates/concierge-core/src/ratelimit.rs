//! Per-key fixed-window rate limiting
//!
//! Each key owns a counter and a window deadline. A window opens on the first
//! request for a key and is replaced once it has expired. Blocked requests
//! never consume budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Default number of tracked keys above which expired entries are swept
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1000;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up and never below 1
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }
}

/// Storage backend for rate-limit state
///
/// Implementations must make `check` atomic per key: two concurrent callers
/// for the same key can never both be admitted into the last free slot.
pub trait RateLimitStore: Send + Sync {
    /// Count a request against `key` and report whether it is admitted
    fn check(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitDecision;

    /// Report the current state for `key` without counting a request
    fn peek(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitDecision;

    /// Drop every entry whose window has expired, returning how many went
    fn sweep_expired(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Process-local rate limiter guarded by a single mutex
pub struct InMemoryRateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    sweep_threshold: usize,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }

    pub fn with_sweep_threshold(sweep_threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            sweep_threshold,
        }
    }

    /// `check` evaluated at an explicit instant
    pub fn check_at(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        if max_requests == 0 {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: window_end(now, window),
            };
        }

        let mut entries = self.lock();

        let active = entries.get(key).filter(|entry| now < entry.reset_at).copied();

        let decision = match active {
            Some(entry) if entry.count >= max_requests => RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: entry.reset_at,
            },
            Some(entry) => {
                let count = entry.count + 1;
                entries.insert(key.to_string(), RateLimitEntry { count, ..entry });
                RateLimitDecision {
                    allowed: true,
                    remaining: max_requests - count,
                    reset_at: entry.reset_at,
                }
            }
            None => {
                let reset_at = window_end(now, window);
                entries.insert(key.to_string(), RateLimitEntry { count: 1, reset_at });
                if entries.len() > self.sweep_threshold {
                    let before = entries.len();
                    entries.retain(|_, entry| now < entry.reset_at);
                    tracing::debug!(
                        "Swept {} expired rate-limit entries",
                        before - entries.len()
                    );
                }
                RateLimitDecision {
                    allowed: true,
                    remaining: max_requests - 1,
                    reset_at,
                }
            }
        };

        if !decision.allowed {
            tracing::debug!("Rate limit exceeded for key {}", key);
        }

        decision
    }

    /// `peek` evaluated at an explicit instant
    pub fn peek_at(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let entries = self.lock();
        match entries.get(key) {
            Some(entry) if now < entry.reset_at => {
                let remaining = max_requests.saturating_sub(entry.count);
                RateLimitDecision {
                    allowed: remaining > 0,
                    remaining,
                    reset_at: entry.reset_at,
                }
            }
            _ => RateLimitDecision {
                allowed: max_requests > 0,
                remaining: max_requests,
                reset_at: window_end(now, window),
            },
        }
    }

    /// `sweep_expired` evaluated at an explicit instant
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.reset_at);
        before - entries.len()
    }

    /// Forget all keys
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Number of keys currently held (expired or not)
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        // The map holds plain counters; a panic mid-update cannot leave it inconsistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitStore for InMemoryRateLimiter {
    fn check(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitDecision {
        self.check_at(key, max_requests, window, Utc::now())
    }

    fn peek(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitDecision {
        self.peek_at(key, max_requests, window, Utc::now())
    }

    fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }
}

/// End of a window opened at `now`, saturating at the latest representable instant
fn window_end(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| now.checked_add_signed(window))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
