//! HTTP request handlers for the API gateway.

pub mod health;
pub mod me;
pub mod metrics;

pub use health::health_check;
pub use me::{get_admin_me, get_me, get_session};
pub use metrics::metrics_handler;
