//! Configuration parsing shared by the token issuer and the edge.
//!
//! Both services read the signing secret and clock skew from the same
//! variables; each service's `Config::from_vars` calls into these helpers and
//! adds its own settings.

use crate::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use crate::secret::{SigningSecret, SigningSecretError};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Shared HS256 secret.
pub const JWT_SECRET_VAR: &str = "JWT_SECRET";

/// Allowed `iat` lead, in seconds.
pub const JWT_CLOCK_SKEW_SECONDS_VAR: &str = "JWT_CLOCK_SKEW_SECONDS";

/// Set to `json` for JSON-formatted logs.
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

/// Errors parsing the shared token settings.
#[derive(Debug, Error)]
pub enum TokenConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT_SECRET: {0}")]
    InvalidSecret(#[from] SigningSecretError),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidClockSkew(String),

    #[error("Invalid {name}: {reason}")]
    InvalidDuration { name: String, reason: String },
}

/// Read and validate `JWT_SECRET`.
///
/// # Errors
///
/// `MissingEnvVar` when absent, `InvalidSecret` when shorter than 32 bytes.
pub fn signing_secret_from_vars(
    vars: &HashMap<String, String>,
) -> Result<SigningSecret, TokenConfigError> {
    let raw = vars
        .get(JWT_SECRET_VAR)
        .ok_or_else(|| TokenConfigError::MissingEnvVar(JWT_SECRET_VAR.to_string()))?;
    Ok(SigningSecret::from_text(raw)?)
}

/// Read `JWT_CLOCK_SKEW_SECONDS`, defaulting to [`DEFAULT_CLOCK_SKEW`].
///
/// # Errors
///
/// `InvalidClockSkew` unless the value is an integer in `1..=600`.
pub fn clock_skew_from_vars(vars: &HashMap<String, String>) -> Result<Duration, TokenConfigError> {
    let Some(value_str) = vars.get(JWT_CLOCK_SKEW_SECONDS_VAR) else {
        return Ok(DEFAULT_CLOCK_SKEW);
    };

    let value: i64 = value_str.parse().map_err(|e| {
        TokenConfigError::InvalidClockSkew(format!(
            "{JWT_CLOCK_SKEW_SECONDS_VAR} must be a valid integer, got '{value_str}': {e}"
        ))
    })?;

    if value <= 0 {
        return Err(TokenConfigError::InvalidClockSkew(format!(
            "{JWT_CLOCK_SKEW_SECONDS_VAR} must be positive, got {value}"
        )));
    }

    #[allow(clippy::cast_possible_wrap)]
    let max_skew = MAX_CLOCK_SKEW.as_secs() as i64;
    if value > max_skew {
        return Err(TokenConfigError::InvalidClockSkew(format!(
            "{JWT_CLOCK_SKEW_SECONDS_VAR} must not exceed {max_skew} seconds, got {value}"
        )));
    }

    #[allow(clippy::cast_sign_loss)]
    Ok(Duration::from_secs(value as u64))
}

/// Read a millisecond duration, falling back to `default_ms` when unset.
///
/// # Errors
///
/// `InvalidDuration` unless the value is an integer of at least `min_ms`.
pub fn duration_ms_from_vars(
    vars: &HashMap<String, String>,
    name: &str,
    default_ms: u64,
    min_ms: u64,
) -> Result<u64, TokenConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default_ms);
    };

    let value: u64 = value_str
        .parse()
        .map_err(|e| TokenConfigError::InvalidDuration {
            name: name.to_string(),
            reason: format!("must be a non-negative integer, got '{value_str}': {e}"),
        })?;

    if value < min_ms {
        return Err(TokenConfigError::InvalidDuration {
            name: name.to_string(),
            reason: format!("must be at least {min_ms} ms, got {value}"),
        });
    }

    Ok(value)
}

/// Whether `LOG_FORMAT=json` was requested.
#[must_use]
pub fn json_logs_from_vars(vars: &HashMap<String, String>) -> bool {
    vars.get(LOG_FORMAT_VAR)
        .is_some_and(|v| v.eq_ignore_ascii_case("json"))
}
