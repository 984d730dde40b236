//! Types shared by the token issuer (`auth-service`) and the edge
//! (`api-gateway`): the claim schema, the signing secret and verification.

#![warn(clippy::pedantic)]

/// Module for shared configuration parsing
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT claims, verification and bearer parsing
pub mod jwt;

/// Module for role and token-kind types
pub mod types;
