//! Route authorization on top of the edge filter.
//!
//! These run after [`authenticate`](super::auth::authenticate) and turn an
//! absent or insufficient identity into 401 or 403.

use crate::auth::IdentityContext;
use crate::errors::GatewayError;
use axum::{extract::Request, middleware::Next, response::Response};
use common::types::Role;

/// 401 unless the request carries an identity.
pub async fn require_identity(req: Request, next: Next) -> Result<Response, GatewayError> {
    if req.extensions().get::<IdentityContext>().is_none() {
        tracing::debug!(target: "gw.middleware.policy", "Rejected anonymous request");
        return Err(GatewayError::Unauthorized);
    }
    Ok(next.run(req).await)
}

/// 401 for anonymous requests, 403 unless the identity is an admin.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, GatewayError> {
    require_role(Role::Admin, req, next).await
}

async fn require_role(role: Role, req: Request, next: Next) -> Result<Response, GatewayError> {
    let Some(identity) = req.extensions().get::<IdentityContext>() else {
        return Err(GatewayError::Unauthorized);
    };

    if !identity.has_role(role) {
        tracing::debug!(
            target: "gw.middleware.policy",
            required = %role,
            actual = %identity.role,
            "Rejected request with insufficient role"
        );
        return Err(GatewayError::Forbidden(format!("Requires role {role}")));
    }

    Ok(next.run(req).await)
}
