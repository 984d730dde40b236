//! JWT validation for the API gateway.
//!
//! Verifies tokens locally with the secret shared with the auth service; no
//! network call is made per request.
//!
//! # Security
//!
//! - Tokens are size-checked before parsing
//! - Only HS256 is accepted
//! - Refresh tokens are rejected; only access tokens establish an identity
//! - `iat` is checked with clock skew tolerance, `exp` without leeway

use crate::auth::identity::IdentityContext;
use common::jwt::{AccessClaims, TokenVerifier, VerificationFailure};
use common::secret::SigningSecret;
use std::time::Duration;
use tracing::instrument;

/// Access-token validator for the edge filter.
#[derive(Debug, Clone)]
pub struct JwtValidator {
    verifier: TokenVerifier,
}

impl JwtValidator {
    /// Create a validator over the shared secret.
    pub fn new(secret: &SigningSecret, clock_skew: Duration) -> Self {
        Self {
            verifier: TokenVerifier::new(secret, clock_skew),
        }
    }

    /// Verify `token` as an access token and project it to an identity.
    ///
    /// # Errors
    ///
    /// Any [`VerificationFailure`]; `WrongKind` for refresh tokens.
    #[instrument(skip_all, name = "gw.auth.validate")]
    pub fn validate(&self, token: &str) -> Result<IdentityContext, VerificationFailure> {
        let claims = self.verifier.verify_access(token)?;
        Ok(identity_from(claims))
    }

    /// Deterministic form of [`JwtValidator::validate`].
    ///
    /// # Errors
    ///
    /// Same as [`JwtValidator::validate`].
    pub fn validate_at(&self, token: &str, now: i64) -> Result<IdentityContext, VerificationFailure> {
        let claims = self.verifier.verify_access_at(token, now)?;
        Ok(identity_from(claims))
    }
}

fn identity_from(claims: AccessClaims) -> IdentityContext {
    IdentityContext {
        username: claims.sub,
        role: claims.role,
    }
}
