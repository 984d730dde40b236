//! Fixed test IDs and credentials for deterministic tests.

// User IDs
pub const TEST_USER_ALICE_ID: i64 = 42;
pub const TEST_USER_BOB_ID: i64 = 7;

// Usernames and emails
pub const TEST_USERNAME_ALICE: &str = "alice";
pub const TEST_EMAIL_ALICE: &str = "alice@example.com";
pub const TEST_USERNAME_BOB: &str = "bob";
pub const TEST_EMAIL_BOB: &str = "bob@example.com";

// Passwords (plaintext; fixtures hash them at the minimum bcrypt cost)
pub const TEST_PASSWORD_ALICE: &str = "alice-password-123";
pub const TEST_PASSWORD_BOB: &str = "bob-password-456";

// Signing secrets (both at least 32 bytes)
pub const TEST_JWT_SECRET: &[u8] = b"test-signing-secret-0123456789abcdef";
pub const WRONG_JWT_SECRET: &[u8] = b"wrong-signing-secret-fedcba9876543210";
