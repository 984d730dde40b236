use common::config::{
    clock_skew_from_vars, duration_ms_from_vars, json_logs_from_vars, signing_secret_from_vars,
    TokenConfigError,
};
use common::secret::SigningSecret;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default access token lifetime (1 hour).
pub const DEFAULT_ACCESS_TOKEN_TTL_MS: u64 = 3_600_000;

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TOKEN_TTL_MS: u64 = 604_800_000;

/// Shortest TTL accepted; tokens carry whole seconds.
pub const MIN_TOKEN_TTL_MS: u64 = 1_000;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Minimum bcrypt cost accepted (OWASP 2024 floor).
pub const MIN_BCRYPT_COST: u32 = 10;

/// Maximum bcrypt cost accepted; higher values cost close to a second per hash.
pub const MAX_BCRYPT_COST: u32 = 14;

#[derive(Clone)]
pub struct Config {
    pub bind_address: String,
    pub signing_secret: SigningSecret,
    pub access_token_ttl_ms: u64,
    pub refresh_token_ttl_ms: u64,
    pub clock_skew: Duration,
    pub bcrypt_cost: u32,
    pub json_logs: bool,
    pub drain_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("signing_secret", &"[REDACTED]")
            .field("access_token_ttl_ms", &self.access_token_ttl_ms)
            .field("refresh_token_ttl_ms", &self.refresh_token_ttl_ms)
            .field("clock_skew", &self.clock_skew)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("json_logs", &self.json_logs)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Token(#[from] TokenConfigError),

    #[error("Invalid token lifetimes: {0}")]
    InvalidTokenLifetimes(String),

    #[error("Invalid BCRYPT_COST: {0}")]
    InvalidBcryptCost(String),

    #[error("Invalid DRAIN_SECONDS: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8081".to_string());

        let signing_secret = signing_secret_from_vars(vars)?;
        let clock_skew = clock_skew_from_vars(vars)?;

        let access_token_ttl_ms = duration_ms_from_vars(
            vars,
            "JWT_EXPIRATION_MS",
            DEFAULT_ACCESS_TOKEN_TTL_MS,
            MIN_TOKEN_TTL_MS,
        )?;
        let refresh_token_ttl_ms = duration_ms_from_vars(
            vars,
            "JWT_REFRESH_EXPIRATION_MS",
            DEFAULT_REFRESH_TOKEN_TTL_MS,
            MIN_TOKEN_TTL_MS,
        )?;

        // Compared in whole seconds, the granularity of `exp`.
        if refresh_token_ttl_ms / 1000 <= access_token_ttl_ms / 1000 {
            return Err(ConfigError::InvalidTokenLifetimes(format!(
                "refresh lifetime ({refresh_token_ttl_ms} ms) must exceed access lifetime ({access_token_ttl_ms} ms) by at least one whole second"
            )));
        }

        let bcrypt_cost = match vars.get("BCRYPT_COST") {
            Some(value_str) => {
                let cost: u32 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidBcryptCost(format!(
                        "BCRYPT_COST must be a valid integer, got '{value_str}': {e}"
                    ))
                })?;
                if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
                    return Err(ConfigError::InvalidBcryptCost(format!(
                        "BCRYPT_COST must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}, got {cost}"
                    )));
                }
                cost
            }
            None => DEFAULT_BCRYPT_COST,
        };

        let drain_seconds = match vars.get("DRAIN_SECONDS") {
            Some(value_str) => value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "DRAIN_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                ))
            })?,
            None => 0,
        };

        Ok(Config {
            bind_address,
            signing_secret,
            access_token_ttl_ms,
            refresh_token_ttl_ms,
            clock_skew,
            bcrypt_cost,
            json_logs: json_logs_from_vars(vars),
            drain_seconds,
        })
    }
}
