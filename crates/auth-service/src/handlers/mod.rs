pub mod auth_handler;
pub mod metrics_handler;

/// Liveness probe; does not touch the user store.
pub async fn health_check() -> &'static str {
    "OK"
}
