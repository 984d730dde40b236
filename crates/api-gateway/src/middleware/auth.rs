//! Edge authentication filter.
//!
//! Runs once per request before routing. A bearer access token that verifies
//! puts an [`IdentityContext`] into the request extensions; anything else
//! (no header, another scheme, a bad or expired token, a refresh token)
//! leaves the request anonymous. The filter itself never rejects a request;
//! that is left to the route's policy.

use crate::auth::{IdentityContext, JwtValidator};
use crate::observability::metrics::record_edge_auth;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use common::jwt::bearer_token;
use std::sync::Arc;
use tracing::instrument;

/// State for the edge filter.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_validator: Arc<JwtValidator>,
}

/// Bearer token from the `Authorization` header, if any.
///
/// Non-UTF-8 values and other schemes count as absent.
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
}

/// Fail-open authentication filter.
///
/// Always forwards the request to `next`.
#[instrument(skip_all, name = "gw.middleware.auth")]
pub async fn authenticate(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // Only this filter may establish an identity.
    req.extensions_mut().remove::<IdentityContext>();

    match extract_bearer_token(&req) {
        None => {
            record_edge_auth("absent", None);
        }
        Some(token) => match state.jwt_validator.validate(token) {
            Ok(identity) => {
                tracing::debug!(
                    target: "gw.middleware.auth",
                    role = %identity.role,
                    "JWT authentication successful"
                );
                record_edge_auth("verified", None);
                req.extensions_mut().insert(identity);
            }
            Err(failure) => {
                tracing::debug!(
                    target: "gw.middleware.auth",
                    category = failure.category(),
                    "JWT validation failed, continuing without identity"
                );
                record_edge_auth("rejected", Some(failure.category()));
            }
        },
    }

    next.run(req).await
}

/// Access to the identity attached by [`authenticate`].
pub trait IdentityExt {
    /// `None` when the request is anonymous.
    fn identity(&self) -> Option<&IdentityContext>;
}

impl<B> IdentityExt for axum::http::Request<B> {
    fn identity(&self) -> Option<&IdentityContext> {
        self.extensions().get::<IdentityContext>()
    }
}
