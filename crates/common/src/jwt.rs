//! JWT claim schema and verification shared by the token issuer and the edge.
//!
//! This module owns everything both sides must agree on:
//! - The access/refresh claim schema and its wire format
//! - Size limits for DoS prevention
//! - Clock skew constants for iat validation
//! - HS256 verification into a typed [`Claims`] value
//! - Bearer header parsing
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HS256 is accepted; the header `alg` cannot select anything else
//! - The signature is checked before any claim, so a forged token never
//!   reports `Expired`
//! - Generic error messages prevent information leakage
//! - `sub` and `email` are redacted in Debug output
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{Claims, TokenVerifier, DEFAULT_CLOCK_SKEW};
//!
//! let verifier = TokenVerifier::new(&secret, DEFAULT_CLOCK_SKEW);
//! match verifier.verify(token)? {
//!     Claims::Access(access) => println!("{} is {}", access.sub, access.role),
//!     Claims::Refresh(_) => {}
//! }
//! ```

use crate::secret::{ExposeSecret, SigningSecret};
use crate::types::{Role, TokenKind};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical tokens are 250-450 bytes. Anything larger is rejected before
/// base64 decoding or MAC computation.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default tolerance for `iat` values ahead of the local clock.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Upper bound accepted for a configured clock skew tolerance.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Authorization scheme prefix, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Value of the `type` claim on refresh tokens.
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// The only signing algorithm issued or accepted.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

// =============================================================================
// Error Types
// =============================================================================

/// Reasons a token was not accepted.
///
/// Every variant renders the same message so callers cannot leak which check
/// failed. Use [`VerificationFailure::category`] for logs and metrics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Bad structure, bad signature, wrong algorithm or unusable claims.
    #[error("The access token is invalid or expired")]
    Malformed,

    /// `iat` is further in the future than the configured clock skew.
    #[error("The access token is invalid or expired")]
    IssuedInFuture,

    /// Signature is valid but `now >= exp`.
    #[error("The access token is invalid or expired")]
    Expired,

    /// A valid token of the other kind was presented.
    #[error("The access token is invalid or expired")]
    WrongKind {
        /// Kind the caller required.
        expected: TokenKind,
        /// Kind the token carries.
        found: TokenKind,
    },
}

impl VerificationFailure {
    /// Bounded label for logs and metrics.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            VerificationFailure::TokenTooLarge => "token_too_large",
            VerificationFailure::Malformed => "malformed",
            VerificationFailure::IssuedInFuture => "issued_in_future",
            VerificationFailure::Expired => "expired",
            VerificationFailure::WrongKind { .. } => "wrong_kind",
        }
    }
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims of an access token.
///
/// Wire form: `{"sub","iat","exp","userId","email","fullName","role"}` with
/// `userId` written as a decimal string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// Username - redacted in Debug output.
    pub sub: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Numeric identity id.
    #[serde(with = "user_id_string")]
    pub user_id: i64,

    /// Email address - redacted in Debug output.
    pub email: String,

    /// Display name.
    pub full_name: String,

    /// Role granted at issuance time.
    pub role: Role,
}

impl fmt::Debug for AccessClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClaims")
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("user_id", &self.user_id)
            .field("email", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .finish()
    }
}

/// Marker serialized as `"type": "refresh"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshMarker {
    #[default]
    #[serde(rename = "refresh")]
    Refresh,
}

/// Claims of a refresh token. Carries no role, email or display name.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    /// Username - redacted in Debug output.
    pub sub: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Numeric identity id.
    #[serde(with = "user_id_string")]
    pub user_id: i64,

    /// Always `"refresh"`.
    #[serde(rename = "type")]
    pub token_type: RefreshMarker,
}

impl fmt::Debug for RefreshClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshClaims")
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// A verified token's claims, decoded once into one of the two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claims {
    /// Access token claims.
    Access(AccessClaims),
    /// Refresh token claims.
    Refresh(RefreshClaims),
}

impl Claims {
    /// Which kind of token these claims came from.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            Claims::Access(_) => TokenKind::Access,
            Claims::Refresh(_) => TokenKind::Refresh,
        }
    }

    /// Username (`sub`).
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Claims::Access(c) => &c.sub,
            Claims::Refresh(c) => &c.sub,
        }
    }

    /// Numeric identity id.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        match self {
            Claims::Access(c) => c.user_id,
            Claims::Refresh(c) => c.user_id,
        }
    }

    /// Issued-at timestamp.
    #[must_use]
    pub fn issued_at(&self) -> i64 {
        match self {
            Claims::Access(c) => c.iat,
            Claims::Refresh(c) => c.iat,
        }
    }

    /// Expiration timestamp.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        match self {
            Claims::Access(c) => c.exp,
            Claims::Refresh(c) => c.exp,
        }
    }

    /// Role of an access token.
    ///
    /// # Errors
    ///
    /// `WrongKind` for refresh claims, which never carry a role.
    pub fn role(&self) -> Result<Role, VerificationFailure> {
        match self {
            Claims::Access(c) => Ok(c.role),
            Claims::Refresh(_) => Err(VerificationFailure::WrongKind {
                expected: TokenKind::Access,
                found: TokenKind::Refresh,
            }),
        }
    }

    /// Narrow to access claims.
    ///
    /// # Errors
    ///
    /// `WrongKind` for refresh claims.
    pub fn into_access(self) -> Result<AccessClaims, VerificationFailure> {
        match self {
            Claims::Access(c) => Ok(c),
            Claims::Refresh(_) => Err(VerificationFailure::WrongKind {
                expected: TokenKind::Access,
                found: TokenKind::Refresh,
            }),
        }
    }

    /// Narrow to refresh claims.
    ///
    /// # Errors
    ///
    /// `WrongKind` for access claims.
    pub fn into_refresh(self) -> Result<RefreshClaims, VerificationFailure> {
        match self {
            Claims::Refresh(c) => Ok(c),
            Claims::Access(_) => Err(VerificationFailure::WrongKind {
                expected: TokenKind::Refresh,
                found: TokenKind::Access,
            }),
        }
    }
}

/// Payload as it arrives on the wire, before the kind is decided.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClaims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(with = "user_id_string")]
    user_id: i64,
    email: Option<String>,
    full_name: Option<String>,
    role: Option<Role>,
    #[serde(rename = "type")]
    token_type: Option<String>,
}

impl TryFrom<RawClaims> for Claims {
    type Error = VerificationFailure;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        match raw.token_type.as_deref() {
            None => {
                let (Some(email), Some(full_name), Some(role)) =
                    (raw.email, raw.full_name, raw.role)
                else {
                    tracing::debug!(
                        target: "common.jwt",
                        "Token rejected: access claims incomplete"
                    );
                    return Err(VerificationFailure::Malformed);
                };
                Ok(Claims::Access(AccessClaims {
                    sub: raw.sub,
                    iat: raw.iat,
                    exp: raw.exp,
                    user_id: raw.user_id,
                    email,
                    full_name,
                    role,
                }))
            }
            Some(REFRESH_TOKEN_TYPE) => Ok(Claims::Refresh(RefreshClaims {
                sub: raw.sub,
                iat: raw.iat,
                exp: raw.exp,
                user_id: raw.user_id,
                token_type: RefreshMarker::Refresh,
            })),
            Some(other) => {
                tracing::debug!(
                    target: "common.jwt",
                    token_type = %other,
                    "Token rejected: unknown token type"
                );
                Err(VerificationFailure::Malformed)
            }
        }
    }
}

/// `userId` is written as a decimal string; numbers are accepted on read.
mod user_id_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(i64),
    }

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(id) => Ok(id),
            Repr::Text(text) => text.parse().map_err(de::Error::custom),
        }
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Take the token out of an `Authorization` header value.
///
/// Returns `None` unless the value starts with exactly `"Bearer "`.
#[must_use]
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix(BEARER_PREFIX)
}

/// Reject an `iat` more than `clock_skew` ahead of `now` with
/// `VerificationFailure::IssuedInFuture`.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), VerificationFailure> {
    // clock_skew is bounded to MAX_CLOCK_SKEW by configuration
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            clock_skew_secs = clock_skew_secs,
            "Token rejected: iat too far in the future"
        );
        return Err(VerificationFailure::IssuedInFuture);
    }

    Ok(())
}

// =============================================================================
// Verifier
// =============================================================================

/// Stateless HS256 verifier.
///
/// Holds only the decoding key derived from the shared secret and the clock
/// skew tolerance; verification is a pure function of (token, key, now).
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    clock_skew: Duration,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("clock_skew", &self.clock_skew)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Build a verifier over `secret`.
    #[must_use]
    pub fn new(secret: &SigningSecret, clock_skew: Duration) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // Expiry is checked against an explicit `now` in `verify_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret()),
            validation,
            clock_skew,
        }
    }

    /// Verify against the wall clock.
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::verify_at`].
    pub fn verify(&self, token: &str) -> Result<Claims, VerificationFailure> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify a token as of `now` (Unix seconds).
    ///
    /// Order: size, signature and structure, `iat` skew, expiry.
    ///
    /// # Errors
    ///
    /// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
    /// - `Malformed` - bad structure, signature, algorithm or claims
    /// - `IssuedInFuture` - `iat` beyond the clock skew tolerance
    /// - `Expired` - `now >= exp`
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, VerificationFailure> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "common.jwt",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(VerificationFailure::TokenTooLarge);
        }

        let token_data =
            decode::<RawClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(target: "common.jwt", error = ?e.kind(), "Token rejected: decode failed");
                VerificationFailure::Malformed
            })?;

        let claims = Claims::try_from(token_data.claims)?;

        validate_iat_at(claims.issued_at(), self.clock_skew, now)?;

        if now >= claims.expires_at() {
            tracing::debug!(
                target: "common.jwt",
                exp = claims.expires_at(),
                now = now,
                "Token rejected: expired"
            );
            return Err(VerificationFailure::Expired);
        }

        Ok(claims)
    }

    /// Verify and require an access token.
    ///
    /// # Errors
    ///
    /// Any [`TokenVerifier::verify`] failure, or `WrongKind` for refresh tokens.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, VerificationFailure> {
        self.verify(token)?.into_access()
    }

    /// Deterministic form of [`TokenVerifier::verify_access`].
    ///
    /// # Errors
    ///
    /// Same as [`TokenVerifier::verify_access`].
    pub fn verify_access_at(
        &self,
        token: &str,
        now: i64,
    ) -> Result<AccessClaims, VerificationFailure> {
        self.verify_at(token, now)?.into_access()
    }
}

// =============================================================================
// Tests
// =============================================================================
