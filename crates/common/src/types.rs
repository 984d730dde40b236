//! Common data types shared by the token issuer and the edge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization role carried in access tokens.
///
/// Serialized as the upper-case role name (`"USER"`, `"ADMIN"`), which is the
/// wire form every issued token uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular account.
    User,
    /// Administrative account.
    Admin,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Granted authority string used by downstream authorization
    /// (`ROLE_USER`, `ROLE_ADMIN`).
    #[must_use]
    pub fn authority(self) -> String {
        format!("ROLE_{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two token shapes a token carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Short-lived token used to authorize requests.
    Access,
    /// Long-lived token only usable to obtain a new pair.
    Refresh,
}

impl TokenKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
