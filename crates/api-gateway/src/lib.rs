//! API Gateway Library
//!
//! Edge of the platform: verifies bearer access tokens locally with the
//! secret shared with the auth service and attaches the caller's identity
//! to each request. Verification failures never fail the request; routes
//! decide for themselves whether an identity is required.
//!
//! # Modules
//!
//! - `auth` - Identity context and local JWT validation
//! - `config` - Service configuration
//! - `errors` - Authorization error responses
//! - `handlers` - HTTP request handlers
//! - `middleware` - Edge filter, route policy and metrics middleware
//! - `observability` - Metrics
//! - `routes` - Router assembly

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
