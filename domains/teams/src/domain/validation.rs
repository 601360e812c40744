//! Validation helpers and constants for team names and invite codes

use hackhub_common::{Error, Result};
use regex::Regex;

/// Minimum team name length, in characters after trimming
pub const TEAM_NAME_MIN_LEN: usize = 3;

pub const TEAM_NAME_MAX_LEN: usize = 50;

/// Invite code length
pub const INVITE_CODE_LEN: usize = 6;

lazy_static::lazy_static! {
    /// Invite code validation regex
    /// Six uppercase letters or digits, checked after normalization
    pub static ref INVITE_CODE_REGEX: Regex =
        Regex::new(r"^[A-Z0-9]{6}$").unwrap();
}

/// Validate a team name and return it trimmed
pub fn validate_team_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();

    if len < TEAM_NAME_MIN_LEN {
        return Err(Error::Validation(format!(
            "Team name must be at least {} characters",
            TEAM_NAME_MIN_LEN
        )));
    }

    if len > TEAM_NAME_MAX_LEN {
        return Err(Error::Validation(format!(
            "Team name must be at most {} characters",
            TEAM_NAME_MAX_LEN
        )));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(Error::Validation(
            "Team name cannot contain control characters".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Case-insensitive uniqueness key for a team name
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalize user-entered invite code input
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Check an already-normalized invite code
pub fn is_valid_invite_code(code: &str) -> bool {
    INVITE_CODE_REGEX.is_match(code)
}
