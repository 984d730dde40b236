//! HTTP routes for the API gateway.

use crate::auth::JwtValidator;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{
    authenticate, http_metrics_middleware, require_admin, require_identity, AuthState,
};
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Build the application routes.
///
/// - `/health`, `/metrics`, `/api/v1/session` - public
/// - `/api/v1/me` - requires an identity
/// - `/api/v1/admin/me` - requires role `ADMIN`
///
/// Every request passes the edge filter first; the per-route policy decides
/// whether an anonymous request is acceptable.
pub fn build_routes(config: &Config, metrics_handle: PrometheusHandle) -> Router {
    let jwt_validator = Arc::new(JwtValidator::new(
        &config.signing_secret,
        config.clock_skew,
    ));
    let auth_state = Arc::new(AuthState { jwt_validator });

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/session", get(handlers::get_session));

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/api/v1/me", get(handlers::get_me))
        .route_layer(middleware::from_fn(require_identity));

    let admin_routes = Router::new()
        .route("/api/v1/admin/me", get(handlers::get_admin_me))
        .route_layer(middleware::from_fn(require_admin));

    // Layer order (bottom-to-top execution):
    // 1. authenticate - attach identity (innermost global layer)
    // 2. TimeoutLayer
    // 3. TraceLayer
    // 4. http_metrics_middleware - record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(auth_state, authenticate))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}
