//! Fixed-window counting
//!
//! A window opens on the first request and admits `max_requests` until
//! `window_start + window` has passed. The first request after that opens a
//! fresh window with a count of one; there is no gradual decay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::RateLimit;

/// Counter state for one (actor, action) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub count: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub window_start: DateTime<Utc>,
}

impl Window {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }

    pub fn reset_at(&self, limit: &RateLimit) -> DateTime<Utc> {
        self.window_start + limit.window
    }

    pub fn is_expired(&self, limit: &RateLimit, now: DateTime<Utc>) -> bool {
        now > self.reset_at(limit)
    }
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Count one request against an existing window.
///
/// Returns the window to persist (`None` when a denied request leaves the
/// stored window untouched) and the decision.
pub fn apply(
    existing: Option<&Window>,
    limit: &RateLimit,
    now: DateTime<Utc>,
) -> (Option<Window>, RateLimitDecision) {
    match existing {
        Some(window) if !window.is_expired(limit, now) => {
            if window.count < limit.max_requests {
                let next = Window {
                    count: window.count + 1,
                    window_start: window.window_start,
                };
                let decision = RateLimitDecision {
                    allowed: true,
                    remaining: limit.max_requests - next.count,
                    reset_at: next.reset_at(limit),
                };
                (Some(next), decision)
            } else {
                let decision = RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    reset_at: window.reset_at(limit),
                };
                (None, decision)
            }
        }
        // Absent or expired: open a fresh window
        _ => {
            let next = Window::fresh(now);
            let decision = RateLimitDecision {
                allowed: true,
                remaining: limit.max_requests - 1,
                reset_at: next.reset_at(limit),
            };
            (Some(next), decision)
        }
    }
}
