//! Configuration management following 12-factor app principles
//!
//! Process-level settings live here; competition rules and rate-limit
//! policy are loaded by the crates that own them.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shared secret used to verify identity-provider tokens
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,

    /// How often expired rate-limit windows are purged, in seconds
    pub rate_limit_cleanup_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_env_only()
    }

    /// Load configuration without consulting a `.env` file
    pub fn from_env_only() -> Result<Self> {
        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is required"))?,
            jwt_issuer: env::var("JWT_ISSUER").ok(),
            jwt_audience: env::var("JWT_AUDIENCE").ok(),

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "hackhub=debug".to_string()),
            port: parse_var("PORT", 3000)?,
            rate_limit_cleanup_secs: parse_var("RATE_LIMIT_CLEANUP_SECS", 300)?,
        };

        Ok(config)
    }
}

/// Read an env var and parse it, falling back to `default` when unset.
///
/// A set-but-malformed value is an error rather than a silent default.
pub fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_requires_jwt_secret() {
        env::remove_var("JWT_SECRET");
        let result = Config::from_env_only();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        env::set_var("JWT_SECRET", "test-secret");
        env::remove_var("PORT");
        env::remove_var("RATE_LIMIT_CLEANUP_SECS");

        let config = Config::from_env_only().unwrap();
        assert_eq!(config.jwt_secret, "test-secret");
        assert_eq!(config.port, 3000);
        assert_eq!(config.rate_limit_cleanup_secs, 300);

        env::remove_var("JWT_SECRET");
    }

    #[test]
    #[serial]
    fn test_parse_var_rejects_malformed_values() {
        env::set_var("HACKHUB_TEST_NUMBER", "not-a-number");
        let result: Result<u16> = parse_var("HACKHUB_TEST_NUMBER", 1);
        assert!(result.is_err());

        env::set_var("HACKHUB_TEST_NUMBER", " 42 ");
        let result: Result<u16> = parse_var("HACKHUB_TEST_NUMBER", 1);
        assert_eq!(result.unwrap(), 42);

        env::remove_var("HACKHUB_TEST_NUMBER");
        let result: Result<u16> = parse_var("HACKHUB_TEST_NUMBER", 7);
        assert_eq!(result.unwrap(), 7);
    }
}
