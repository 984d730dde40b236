//! Observability module for the API gateway.
//!
//! Provides metrics definitions. Tokens and usernames are never used as
//! metric labels or logged in plaintext by the edge filter.

pub mod metrics;
