use crate::errors::AuthError;
use crate::models::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest, UserInfo};
use crate::services::auth_service::Registration;
use crate::services::AuthService;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use common::secret::ExposeSecret;
use std::sync::Arc;
use tracing::instrument;

/// Application state shared across handlers
pub struct AppState {
    pub auth: AuthService,
}

/// `Authorization` header as text; non-UTF-8 values count as absent.
fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Handle login
///
/// POST /api/auth/login
#[instrument(skip_all, name = "auth.handlers.login")]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state
        .auth
        .login(&payload.username_or_email, &payload.password)
        .await?;

    Ok(Json(response))
}

/// Handle self-registration
///
/// POST /api/auth/register
#[instrument(skip_all, name = "auth.handlers.register")]
pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state
        .auth
        .register(Registration {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
        })
        .await?;

    Ok(Json(response))
}

/// Handle refresh token rotation
///
/// POST /api/auth/refresh
#[instrument(skip_all, name = "auth.handlers.refresh")]
pub async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state
        .auth
        .refresh(payload.refresh_token.expose_secret())
        .await?;

    Ok(Json(response))
}

/// Handle logout
///
/// POST /api/auth/logout
#[instrument(skip_all, name = "auth.handlers.logout")]
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<&'static str, AuthError> {
    state.auth.logout(authorization(&headers))?;
    Ok("Logged out successfully")
}

/// Handle token validation; always 200 with `true` or `false`
///
/// GET /api/auth/validate
#[instrument(skip_all, name = "auth.handlers.validate")]
pub async fn handle_validate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<bool> {
    Json(state.auth.validate(authorization(&headers)))
}

/// Handle profile lookup
///
/// GET /api/auth/profile
#[instrument(skip_all, name = "auth.handlers.profile")]
pub async fn handle_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserInfo>, AuthError> {
    let profile = state.auth.profile(authorization(&headers)).await?;
    Ok(Json(profile))
}

/// GET /api/auth/health
pub async fn handle_service_health() -> &'static str {
    "Auth Service is running"
}
