//! Observability module for the auth service.
//!
//! # Privacy by Default
//!
//! All instrumentation uses `#[instrument(skip_all)]` and explicit safe field
//! allow-listing. Fields are categorized as:
//! - **SAFE**: Can be logged in plaintext (roles, token kinds, failure categories)
//! - **HASHED**: Must be SHA-256 hashed for correlation (usernames, logins)
//! - **NEVER**: Must never appear in logs (passwords, tokens, the signing secret)

pub mod metrics;

use crate::errors::AuthError;
use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// One-way and truncated; enough to follow one user across log lines without
/// writing the username itself.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    result
        .get(..4)
        .map(hex::encode)
        .unwrap_or_default()
}

/// Error categories for metrics labels (bounded cardinality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad credentials or a taken username/email
    Authentication,
    /// Token verification failures
    Token,
    /// Malformed client input or unknown identity
    Client,
    /// Crypto and internal errors
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Token => "token",
            ErrorCategory::Client => "client",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&AuthError> for ErrorCategory {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::CredentialTaken(_) => {
                ErrorCategory::Authentication
            }
            AuthError::InvalidToken(_)
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidHeaderFormat => ErrorCategory::Token,
            AuthError::BadRequest(_) | AuthError::IdentityNotFound => ErrorCategory::Client,
            AuthError::Crypto(_) | AuthError::Internal => ErrorCategory::Internal,
        }
    }
}

/// Metric labels for a finished flow: `("success", None)` or
/// `("error", Some(category))`.
pub fn outcome_labels<T>(result: &Result<T, AuthError>) -> (&'static str, Option<&'static str>) {
    match result {
        Ok(_) => ("success", None),
        Err(e) => ("error", Some(ErrorCategory::from(e).as_str())),
    }
}
