//! # Auth Test Utilities
//!
//! Shared test utilities for the auth service and the API gateway.
//!
//! This crate provides:
//! - Deterministic fixtures (fixed signing secrets, seeded identities)
//! - Token builders for hand-crafted, expired, forged and tampered tokens
//! - Server test harness (`TestAuthServer` for E2E tests)
//! - Fixed test IDs and credentials
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestAuthServer::spawn().await?;
//!     server.seed_user(alice_identity(), TEST_PASSWORD_ALICE).await?;
//!
//!     let token = TestTokenBuilder::new()
//!         .for_user("alice")
//!         .with_role("ADMIN")
//!         .sign(TEST_JWT_SECRET);
//!
//!     token.assert_valid_jwt().assert_for_subject("alice");
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
