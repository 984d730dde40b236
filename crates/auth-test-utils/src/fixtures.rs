//! Deterministic fixtures for reproducible tests.
//!
//! **DO NOT USE IN PRODUCTION.** The secrets here are public.

use crate::test_ids::*;
use auth_service::config::MIN_BCRYPT_COST;
use auth_service::crypto;
use auth_service::models::{Identity, Role, UserRecord};
use common::secret::SigningSecret;

/// The signing secret shared by every test server and test verifier.
pub fn test_signing_secret() -> SigningSecret {
    SigningSecret::new(TEST_JWT_SECRET.to_vec()).expect("test secret is long enough")
}

/// A valid secret that differs from [`test_signing_secret`].
pub fn wrong_signing_secret() -> SigningSecret {
    SigningSecret::new(WRONG_JWT_SECRET.to_vec()).expect("wrong secret is long enough")
}

/// Alice: active administrator with id 42.
pub fn alice_identity() -> Identity {
    Identity {
        id: TEST_USER_ALICE_ID,
        username: TEST_USERNAME_ALICE.to_string(),
        email: TEST_EMAIL_ALICE.to_string(),
        full_name: "Alice Admin".to_string(),
        role: Role::Admin,
        active: true,
        last_login: None,
    }
}

/// Bob: active regular user with id 7.
pub fn bob_identity() -> Identity {
    Identity {
        id: TEST_USER_BOB_ID,
        username: TEST_USERNAME_BOB.to_string(),
        email: TEST_EMAIL_BOB.to_string(),
        full_name: "Bob User".to_string(),
        role: Role::User,
        active: true,
        last_login: None,
    }
}

/// Pair an identity with a bcrypt hash of `password` at the cheapest allowed cost.
pub fn user_record(identity: Identity, password: &str) -> UserRecord {
    let password_hash =
        crypto::hash_password(password, MIN_BCRYPT_COST).expect("bcrypt hashing should succeed");
    UserRecord {
        identity,
        password_hash,
    }
}
