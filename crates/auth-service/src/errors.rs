use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::jwt::VerificationFailure;
use serde::Serialize;
use thiserror::Error;

/// Message returned for every token failure, whatever the cause.
pub const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Token failed verification; the cause is kept for logging only.
    #[error("Invalid token: {0:?}")]
    InvalidToken(VerificationFailure),

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Authorization header is missing or not a bearer token")]
    InvalidHeaderFormat,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("{0}")]
    CredentialTaken(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

impl From<VerificationFailure> for AuthError {
    fn from(failure: VerificationFailure) -> Self {
        AuthError::InvalidToken(failure)
    }
}

impl AuthError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidToken(_)
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidHeaderFormat
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::IdentityNotFound => StatusCode::NOT_FOUND,
            AuthError::CredentialTaken(_) => StatusCode::CONFLICT,
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::Crypto(_) | AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match &self {
            // Header and verification failures are indistinguishable to callers.
            AuthError::InvalidToken(_) | AuthError::InvalidHeaderFormat => {
                ("INVALID_TOKEN", INVALID_TOKEN_MESSAGE.to_string())
            }
            AuthError::InvalidRefreshToken => (
                "INVALID_REFRESH_TOKEN",
                "Invalid or expired refresh token".to_string(),
            ),
            AuthError::InvalidCredentials => (
                "INVALID_CREDENTIALS",
                "Invalid username/email or password".to_string(),
            ),
            AuthError::IdentityNotFound => ("IDENTITY_NOT_FOUND", "User not found".to_string()),
            AuthError::CredentialTaken(reason) => ("CREDENTIAL_TAKEN", reason.clone()),
            AuthError::BadRequest(reason) => ("BAD_REQUEST", reason.clone()),
            AuthError::Crypto(_) => (
                "CRYPTO_ERROR",
                "An internal cryptographic error occurred".to_string(),
            ),
            AuthError::Internal => ("INTERNAL_ERROR", "An internal error occurred".to_string()),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
