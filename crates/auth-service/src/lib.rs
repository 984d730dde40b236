//! Auth Service Library
//!
//! Issues and verifies the HS256 access/refresh tokens used across the
//! platform, and serves the login, registration and refresh flows over HTTP.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Token signing and password hashing
//! - `errors` - Error types and their HTTP mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP middleware
//! - `models` - Identities and request/response bodies
//! - `observability` - Metrics and log correlation helpers
//! - `repositories` - User store
//! - `routes` - Router assembly
//! - `services` - Token authority and auth flows

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
