//! Custom test assertions for issued tokens.
//!
//! These decode the payload without checking the signature; pair them with
//! a real verification when the signature matters.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT is missing segment {index}"));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("JWT segment {index} is not base64url: {e}"))
}

fn payload(token: &str) -> Value {
    serde_json::from_slice(&segment(token, 1)).expect("Failed to parse JWT claims")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// response.access_token
///     .assert_valid_jwt()
///     .assert_access_token()
///     .assert_for_subject("alice")
///     .assert_has_role("ADMIN");
/// ```
pub trait TokenAssertions {
    /// Assert three segments, an HS256 `JWT` header and a JSON payload
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert the role claim
    fn assert_has_role(&self, role: &str) -> &Self;

    /// Assert the `userId` claim (a decimal string)
    fn assert_user_id(&self, user_id: i64) -> &Self;

    /// Assert the token carries no `type` claim
    fn assert_access_token(&self) -> &Self;

    /// Assert `type == "refresh"`
    fn assert_refresh_token(&self) -> &Self;

    /// Assert the token expires within `seconds` of now (5 s tolerance)
    fn assert_expires_in(&self, seconds: u64) -> &Self;
}

impl TokenAssertions for str {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {parts}"
        );

        let header: JwtHeader =
            serde_json::from_slice(&segment(self, 0)).expect("Failed to parse JWT header JSON");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        assert!(payload(self).is_object(), "JWT payload must be an object");
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = payload(self);
        assert_eq!(
            claims["sub"], subject,
            "Expected subject '{subject}', got {}",
            claims["sub"]
        );
        self
    }

    fn assert_has_role(&self, role: &str) -> &Self {
        let claims = payload(self);
        assert_eq!(
            claims["role"], role,
            "Expected role '{role}', got {}",
            claims["role"]
        );
        self
    }

    fn assert_user_id(&self, user_id: i64) -> &Self {
        let claims = payload(self);
        assert_eq!(
            claims["userId"],
            user_id.to_string(),
            "Expected userId \"{user_id}\", got {}",
            claims["userId"]
        );
        self
    }

    fn assert_access_token(&self) -> &Self {
        let claims = payload(self);
        assert!(
            claims.get("type").is_none(),
            "Access token must not carry a type claim, got {}",
            claims["type"]
        );
        assert!(claims.get("role").is_some(), "Access token must carry a role");
        self
    }

    fn assert_refresh_token(&self) -> &Self {
        let claims = payload(self);
        assert_eq!(claims["type"], "refresh", "Expected a refresh token");
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let claims = payload(self);
        let exp = claims["exp"].as_i64().expect("exp must be an integer");
        let expires_in = exp - chrono::Utc::now().timestamp();
        let expected = i64::try_from(seconds).expect("seconds fits in i64");

        assert!(
            (expires_in - expected).abs() <= 5,
            "Expected token to expire in {seconds} seconds, but expires in {expires_in} seconds"
        );
        self
    }
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        self.as_str().assert_valid_jwt();
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        self.as_str().assert_for_subject(subject);
        self
    }

    fn assert_has_role(&self, role: &str) -> &Self {
        self.as_str().assert_has_role(role);
        self
    }

    fn assert_user_id(&self, user_id: i64) -> &Self {
        self.as_str().assert_user_id(user_id);
        self
    }

    fn assert_access_token(&self) -> &Self {
        self.as_str().assert_access_token();
        self
    }

    fn assert_refresh_token(&self) -> &Self {
        self.as_str().assert_refresh_token();
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        self.as_str().assert_expires_in(seconds);
        self
    }
}
