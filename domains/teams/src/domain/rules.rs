//! Competition rules for team formation

use std::str::FromStr;

use anyhow::{anyhow, Result};
use hackhub_common::config::parse_var;
use serde::{Deserialize, Serialize};

/// What happens to pending join requests once a team fills its last seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOverflowPolicy {
    /// Requests stay pending; approving one fails with `TeamFull`
    #[default]
    LeavePending,
    /// The transaction that fills the team deletes every other pending request
    AutoReject,
}

impl FromStr for JoinOverflowPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "leave_pending" => Ok(JoinOverflowPolicy::LeavePending),
            "auto_reject" => Ok(JoinOverflowPolicy::AutoReject),
            other => Err(anyhow!("unknown join overflow policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRules {
    pub min_team_size: usize,
    pub max_team_size: usize,
    pub overflow_policy: JoinOverflowPolicy,
    /// Attempts for an optimistic transaction before reporting contention
    pub tx_max_attempts: u32,
    pub invite_code_max_attempts: u32,
}

impl Default for TeamRules {
    fn default() -> Self {
        Self {
            min_team_size: 1,
            max_team_size: 5,
            overflow_policy: JoinOverflowPolicy::default(),
            tx_max_attempts: 8,
            invite_code_max_attempts: 5,
        }
    }
}

impl TeamRules {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env_only()
    }

    pub fn from_env_only() -> Result<Self> {
        let defaults = Self::default();
        let rules = Self {
            min_team_size: parse_var("MIN_TEAM_SIZE", defaults.min_team_size)?,
            max_team_size: parse_var("MAX_TEAM_SIZE", defaults.max_team_size)?,
            overflow_policy: parse_var("JOIN_OVERFLOW_POLICY", defaults.overflow_policy)?,
            tx_max_attempts: parse_var("TX_MAX_ATTEMPTS", defaults.tx_max_attempts)?,
            invite_code_max_attempts: parse_var(
                "INVITE_CODE_MAX_ATTEMPTS",
                defaults.invite_code_max_attempts,
            )?,
        };
        rules.validate()?;
        Ok(rules)
    }

    pub fn with_min_team_size(mut self, min_team_size: usize) -> Self {
        self.min_team_size = min_team_size;
        self
    }

    pub fn with_max_team_size(mut self, max_team_size: usize) -> Self {
        self.max_team_size = max_team_size;
        self
    }

    pub fn with_overflow_policy(mut self, overflow_policy: JoinOverflowPolicy) -> Self {
        self.overflow_policy = overflow_policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_team_size < 1 {
            return Err(anyhow!("MIN_TEAM_SIZE must be at least 1"));
        }
        if self.max_team_size < self.min_team_size {
            return Err(anyhow!(
                "MAX_TEAM_SIZE ({}) must not be below MIN_TEAM_SIZE ({})",
                self.max_team_size,
                self.min_team_size
            ));
        }
        if self.tx_max_attempts < 1 || self.invite_code_max_attempts < 1 {
            return Err(anyhow!("retry attempt limits must be at least 1"));
        }
        Ok(())
    }
}
