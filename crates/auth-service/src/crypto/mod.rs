//! Token signing and password hashing.

use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::AuthError;
use common::jwt::TOKEN_ALGORITHM;
use common::secret::{ExposeSecret, SigningSecret};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use std::fmt;
use tracing::instrument;

/// HS256 signer over the shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &SigningSecret) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret()),
        }
    }

    /// Sign claims into a compact JWS with header `{"alg":"HS256","typ":"JWT"}`.
    #[instrument(skip_all)]
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        let mut header = Header::new(TOKEN_ALGORITHM);
        header.typ = Some("JWT".to_string());

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Crypto(format!("JWT signing operation failed: {}", e)))
    }
}

/// Hash a password with bcrypt.
///
/// The cost is re-checked against `MIN_BCRYPT_COST..=MAX_BCRYPT_COST` so a
/// direct caller cannot hash with an insecure factor.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(AuthError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| AuthError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AuthError::Crypto(format!("Password verification failed: {}", e)))
}
