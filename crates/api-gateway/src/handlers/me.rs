//! Identity handlers.
//!
//! Report the identity the edge filter attached to the request.

use crate::auth::IdentityContext;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for `/api/v1/me` and `/api/v1/admin/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub role: String,
    pub authority: String,
}

impl From<&IdentityContext> for MeResponse {
    fn from(identity: &IdentityContext) -> Self {
        Self {
            username: identity.username.clone(),
            role: identity.role.to_string(),
            authority: identity.authority(),
        }
    }
}

/// Response for `/api/v1/session`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<MeResponse>,
}

/// Handler for GET /api/v1/me
///
/// Mounted behind `require_identity`, so the extension is always present.
#[instrument(skip_all, name = "gw.handlers.me")]
pub async fn get_me(Extension(identity): Extension<IdentityContext>) -> Json<MeResponse> {
    Json(MeResponse::from(&identity))
}

/// Handler for GET /api/v1/admin/me
#[instrument(skip_all, name = "gw.handlers.admin_me")]
pub async fn get_admin_me(Extension(identity): Extension<IdentityContext>) -> Json<MeResponse> {
    Json(MeResponse::from(&identity))
}

/// Handler for GET /api/v1/session
///
/// Public: answers for anonymous and authenticated callers alike.
#[instrument(skip_all, name = "gw.handlers.session")]
pub async fn get_session(
    identity: Option<Extension<IdentityContext>>,
) -> Json<SessionResponse> {
    let identity = identity.map(|Extension(identity)| MeResponse::from(&identity));
    Json(SessionResponse {
        authenticated: identity.is_some(),
        identity,
    })
}
