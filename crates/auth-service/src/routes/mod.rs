use crate::handlers::{self, auth_handler, metrics_handler};
use crate::middleware::http_metrics_middleware;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::handlers::auth_handler::AppState;

/// Request timeout applied to every route.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the auth service router.
///
/// Every `/api/auth/*` route is public: the handlers that need a token read
/// the `Authorization` header themselves and answer 401 on their own.
/// `/metrics` carries its own `PrometheusHandle` state.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/login", post(auth_handler::handle_login))
        .route("/api/auth/register", post(auth_handler::handle_register))
        .route("/api/auth/refresh", post(auth_handler::handle_refresh))
        .route("/api/auth/logout", post(auth_handler::handle_logout))
        .route("/api/auth/validate", get(auth_handler::handle_validate))
        .route("/api/auth/profile", get(auth_handler::handle_profile))
        .route("/api/auth/health", get(auth_handler::handle_service_health))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler::metrics_handler))
        .with_state(metrics_handle);

    auth_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        // Outermost, so timeouts and framework rejections are counted too
        .layer(middleware::from_fn(http_metrics_middleware))
}
