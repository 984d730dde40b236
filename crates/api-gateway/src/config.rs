//! API gateway configuration.
//!
//! Loaded from environment variables. The signing secret is redacted in
//! Debug output.

use common::config::{
    clock_skew_from_vars, json_logs_from_vars, signing_secret_from_vars, TokenConfigError,
};
use common::secret::SigningSecret;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default drain period on shutdown, in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

/// API gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// HS256 secret shared with the auth service.
    pub signing_secret: SigningSecret,

    /// Tolerance for `iat` values ahead of the local clock.
    pub clock_skew: Duration,

    /// Emit JSON logs (`LOG_FORMAT=json`).
    pub json_logs: bool,

    /// Seconds to keep serving in-flight requests after a shutdown signal.
    pub drain_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("signing_secret", &"[REDACTED]")
            .field("clock_skew", &self.clock_skew)
            .field("json_logs", &self.json_logs)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Token(#[from] TokenConfigError),

    #[error("Invalid DRAIN_SECONDS: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let signing_secret = signing_secret_from_vars(vars)?;
        let clock_skew = clock_skew_from_vars(vars)?;

        let drain_seconds = match vars.get("DRAIN_SECONDS") {
            Some(value_str) => value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "DRAIN_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                ))
            })?,
            None => DEFAULT_DRAIN_SECONDS,
        };

        Ok(Config {
            bind_address,
            signing_secret,
            clock_skew,
            json_logs: json_logs_from_vars(vars),
            drain_seconds,
        })
    }
}
