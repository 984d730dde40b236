//! Identity context attached to a request by the edge filter.

use common::types::Role;
use serde::Serialize;

/// Principal established from a verified access token.
///
/// Present in request extensions only when the token verified; downstream
/// handlers treat its absence as "anonymous".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityContext {
    /// Username from the token subject.
    pub username: String,

    /// Role from the token.
    pub role: Role,
}

impl IdentityContext {
    /// Granted authority, `ROLE_<role>`.
    pub fn authority(&self) -> String {
        self.role.authority()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_prefixes_role() {
        let identity = IdentityContext {
            username: "alice".to_string(),
            role: Role::Admin,
        };

        assert_eq!(identity.authority(), "ROLE_ADMIN");
        assert!(identity.has_role(Role::Admin));
        assert!(!identity.has_role(Role::User));
    }

    #[test]
    fn test_serializes_role_uppercase() {
        let identity = IdentityContext {
            username: "bob".to_string(),
            role: Role::User,
        };

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["username"], "bob");
        assert_eq!(json["role"], "USER");
    }
}
