//! Token verification at the edge.
//!
//! # Components
//!
//! - `identity` - The identity context attached to authenticated requests
//! - `jwt` - Local HS256 verification against the shared secret

pub mod identity;
pub mod jwt;

pub use identity::IdentityContext;
pub use jwt::JwtValidator;
