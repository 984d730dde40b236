//! Middleware for the API gateway.
//!
//! # Components
//!
//! - `auth` - Fail-open edge filter that attaches an `IdentityContext`
//! - `policy` - Per-route authorization on top of the identity context
//! - `http_metrics` - HTTP request metrics

pub mod auth;
pub mod http_metrics;
pub mod policy;

pub use auth::{authenticate, AuthState, IdentityExt};
pub use http_metrics::http_metrics_middleware;
pub use policy::{require_admin, require_identity};
