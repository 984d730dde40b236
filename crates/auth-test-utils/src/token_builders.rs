//! Builders for hand-crafted test tokens.
//!
//! Unlike the token authority these builders sign whatever claims they are
//! given, so tests can produce tokens the authority would never issue:
//! expired, issued in the future, missing claims, signed with the wrong
//! secret or the wrong algorithm.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

use crate::test_ids::{TEST_JWT_SECRET, TEST_USERNAME_ALICE, TEST_USER_ALICE_ID};

/// Builder for test JWTs
///
/// Defaults to a one-hour access token for alice with role `ADMIN`.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("bob")
///     .with_role("USER")
///     .expired(60)
///     .sign(TEST_JWT_SECRET);
/// ```
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
    algorithm: Algorithm,
}

impl TestTokenBuilder {
    /// Create a new builder with access-token defaults
    pub fn new() -> Self {
        let now = Utc::now();
        let mut claims = Map::new();
        claims.insert("sub".into(), json!(TEST_USERNAME_ALICE));
        claims.insert("userId".into(), json!(TEST_USER_ALICE_ID.to_string()));
        claims.insert("email".into(), json!("alice@example.com"));
        claims.insert("fullName".into(), json!("Alice Admin"));
        claims.insert("role".into(), json!("ADMIN"));
        claims.insert("iat".into(), json!(now.timestamp()));
        claims.insert("exp".into(), json!((now + Duration::hours(1)).timestamp()));

        Self {
            claims,
            algorithm: Algorithm::HS256,
        }
    }

    /// Create a builder with refresh-token defaults
    pub fn refresh() -> Self {
        Self::new()
            .without_claim("email")
            .without_claim("fullName")
            .without_claim("role")
            .with_claim("type", json!("refresh"))
    }

    /// Set the subject (username)
    pub fn for_user(self, username: &str) -> Self {
        self.with_claim("sub", json!(username))
    }

    /// Set the user id claim (serialized as a string, as issued)
    pub fn with_user_id(self, user_id: i64) -> Self {
        self.with_claim("userId", json!(user_id.to_string()))
    }

    /// Set the role claim
    pub fn with_role(self, role: &str) -> Self {
        self.with_claim("role", json!(role))
    }

    /// Set expiration in seconds from now (negative means already expired)
    pub fn expires_in(self, seconds: i64) -> Self {
        let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.with_claim("exp", json!(exp))
    }

    /// Expired `seconds_ago`, issued one hour before that
    pub fn expired(self, seconds_ago: i64) -> Self {
        let exp = Utc::now().timestamp() - seconds_ago;
        self.with_claim("exp", json!(exp))
            .with_claim("iat", json!(exp - 3600))
    }

    /// Set issued-at timestamp
    pub fn issued_at(self, timestamp: i64) -> Self {
        self.with_claim("iat", json!(timestamp))
    }

    /// Set or replace an arbitrary claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Remove a claim entirely
    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    /// Sign with a different HMAC algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        Value::Object(self.claims)
    }

    /// Sign the claims with `secret`
    pub fn sign(self, secret: &[u8]) -> String {
        let header = Header::new(self.algorithm);
        jsonwebtoken::encode(
            &header,
            &Value::Object(self.claims),
            &EncodingKey::from_secret(secret),
        )
        .expect("test token signing should succeed")
    }

    /// Sign the claims with [`TEST_JWT_SECRET`]
    pub fn sign_with_test_secret(self) -> String {
        self.sign(TEST_JWT_SECRET)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace one payload claim of a signed token, keeping the original signature.
pub fn tamper_claim(token: &str, name: &str, value: Value) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "token must have three segments");

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .expect("payload should be base64url");
    let mut claims: Map<String, Value> =
        serde_json::from_slice(&payload).expect("payload should be a JSON object");
    claims.insert(name.to_string(), value);

    let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).expect("claims serialize"));
    format!("{}.{}.{}", parts[0], forged, parts[2])
}

/// An unsigned token with `alg: none`.
pub fn unsigned_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims serialize"));
    format!("{header}.{payload}.")
}
