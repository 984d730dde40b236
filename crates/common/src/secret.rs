//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used across the workspace and defines
//! [`SigningSecret`], the HMAC key shared by the token issuer and the edge.
//!
//! `SecretBox<T>` and `SecretString` implement `Debug` with redaction, so a
//! struct that derives `Debug` over them logs safely through `{:?}` and
//! `tracing`. Values are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     username: "alice".to_string(),
//!     password: SecretString::from("hunter2"),
//! };
//!
//! assert!(!format!("{req:?}").contains("hunter2"));
//! let password: &str = req.password.expose_secret();
//! assert_eq!(password, "hunter2");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

use std::fmt;
use thiserror::Error;

/// Minimum signing secret length in bytes (256-bit HMAC key).
pub const MIN_SIGNING_SECRET_BYTES: usize = 32;

/// Errors constructing a [`SigningSecret`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningSecretError {
    /// The secret is shorter than [`MIN_SIGNING_SECRET_BYTES`].
    #[error("signing secret must be at least {MIN_SIGNING_SECRET_BYTES} bytes, got {0}")]
    TooShort(usize),
}

/// HS256 signing secret.
///
/// Built once at startup from configuration and shared read-only by the
/// issuer (sign + verify) and the edge (verify). There is no setter; rotating
/// the secret means constructing a new value and restarting the consumers.
pub struct SigningSecret(SecretBox<Vec<u8>>);

impl SigningSecret {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SigningSecretError::TooShort`] if fewer than
    /// [`MIN_SIGNING_SECRET_BYTES`] bytes are supplied.
    pub fn new(bytes: Vec<u8>) -> Result<Self, SigningSecretError> {
        if bytes.len() < MIN_SIGNING_SECRET_BYTES {
            return Err(SigningSecretError::TooShort(bytes.len()));
        }
        Ok(Self(SecretBox::new(Box::new(bytes))))
    }

    /// Build a secret from its UTF-8 text form; the raw bytes of the string
    /// are the key material.
    ///
    /// # Errors
    ///
    /// Same as [`SigningSecret::new`].
    pub fn from_text(text: &str) -> Result<Self, SigningSecretError> {
        Self::new(text.as_bytes().to_vec())
    }
}

impl ExposeSecret<[u8]> for SigningSecret {
    fn expose_secret(&self) -> &[u8] {
        self.0.expose_secret().as_slice()
    }
}

impl Clone for SigningSecret {
    fn clone(&self) -> Self {
        Self(SecretBox::new(Box::new(self.0.expose_secret().clone())))
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}
