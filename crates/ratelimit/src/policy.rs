//! Rate limit policy table
//!
//! The numbers are policy rather than algorithm, so every action's limit can
//! be overridden from the environment with `RATE_LIMIT_<ACTION>=<max>/<secs>`.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Actions subject to per-actor throttling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    TeamCreate,
    JoinRequest,
    CodeJoin,
    SubmissionWrite,
    BroadcastEmail,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::TeamCreate,
        ActionKind::JoinRequest,
        ActionKind::CodeJoin,
        ActionKind::SubmissionWrite,
        ActionKind::BroadcastEmail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::TeamCreate => "team_create",
            ActionKind::JoinRequest => "join_request",
            ActionKind::CodeJoin => "code_join",
            ActionKind::SubmissionWrite => "submission_write",
            ActionKind::BroadcastEmail => "broadcast_email",
        }
    }

    fn env_var(&self) -> String {
        format!("RATE_LIMIT_{}", self.as_str().to_uppercase())
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow!("unknown action kind: {}", s))
    }
}

/// Maximum number of requests allowed per fixed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimit {
    /// A limit of at least one request over a positive window
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window: if window > Duration::zero() {
                window
            } else {
                Duration::milliseconds(1)
            },
        }
    }

    pub fn per_seconds(max_requests: u32, seconds: i64) -> Self {
        Self::new(max_requests, Duration::seconds(seconds))
    }
}

impl FromStr for RateLimit {
    type Err = anyhow::Error;

    /// Parse `<max>/<window_secs>`, e.g. `3/3600`
    fn from_str(s: &str) -> Result<Self> {
        let (max, secs) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| anyhow!("expected <max>/<window_secs>, got {:?}", s))?;
        let max: u32 = max.trim().parse()?;
        let secs: i64 = secs.trim().parse()?;
        if max == 0 || secs <= 0 {
            return Err(anyhow!("rate limit must be positive, got {:?}", s));
        }
        Ok(Self::per_seconds(max, secs))
    }
}

/// What the limiter does when its counter store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Allow the action; availability wins over strictness
    #[default]
    FailOpen,
    /// Reject the action with a retry-later error
    FailClosed,
}

impl FromStr for FailureMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail_open" | "open" => Ok(FailureMode::FailOpen),
            "fail_closed" | "closed" => Ok(FailureMode::FailClosed),
            other => Err(anyhow!("unknown rate limit failure mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitPolicy {
    limits: HashMap<ActionKind, RateLimit>,
    pub failure_mode: FailureMode,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        let limits = HashMap::from([
            (ActionKind::TeamCreate, RateLimit::per_seconds(3, 3600)),
            (ActionKind::JoinRequest, RateLimit::per_seconds(5, 300)),
            (ActionKind::CodeJoin, RateLimit::per_seconds(10, 300)),
            (ActionKind::SubmissionWrite, RateLimit::per_seconds(10, 60)),
            (ActionKind::BroadcastEmail, RateLimit::per_seconds(2, 600)),
        ]);
        Self {
            limits,
            failure_mode: FailureMode::default(),
        }
    }
}

impl RateLimitPolicy {
    /// Load the default table with any environment overrides applied
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env_only()
    }

    pub fn from_env_only() -> Result<Self> {
        let mut policy = Self::default();

        for action in ActionKind::ALL {
            let var = action.env_var();
            if let Ok(raw) = env::var(&var) {
                let limit = raw
                    .parse::<RateLimit>()
                    .map_err(|e| anyhow!("{} is invalid: {}", var, e))?;
                policy.limits.insert(action, limit);
            }
        }

        if let Ok(raw) = env::var("RATE_LIMIT_FAILURE_MODE") {
            policy.failure_mode = raw.parse()?;
        }

        Ok(policy)
    }

    pub fn with_limit(mut self, action: ActionKind, limit: RateLimit) -> Self {
        self.limits.insert(action, limit);
        self
    }

    pub fn with_failure_mode(mut self, failure_mode: FailureMode) -> Self {
        self.failure_mode = failure_mode;
        self
    }

    pub fn limit_for(&self, action: ActionKind) -> RateLimit {
        // Every action is seeded by Default; the fallback only guards
        // hand-built policies.
        self.limits
            .get(&action)
            .copied()
            .unwrap_or_else(|| RateLimit::per_seconds(10, 60))
    }
}
