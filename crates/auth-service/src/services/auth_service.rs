//! Account flows built on the token authority: login, registration,
//! refresh, logout, validation and profile lookup.

use crate::crypto;
use crate::errors::AuthError;
use crate::models::{AuthResponse, Identity, NewUser, Role, UserInfo};
use crate::observability::metrics::{record_login, record_registration};
use crate::observability::{hash_for_correlation, outcome_labels};
use crate::repositories::UserRepository;
use crate::services::token_service::{TokenAuthority, TokenPair};
use common::jwt::bearer_token;
use common::secret::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::instrument;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Authorization scheme reported in every token response.
pub const TOKEN_TYPE: &str = "Bearer";

/// Registration input after deserialization.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub full_name: String,
}

pub struct AuthService {
    authority: TokenAuthority,
    users: Arc<dyn UserRepository>,
    bcrypt_cost: u32,
    /// Verified instead of a real hash when the login is unknown, so both
    /// paths spend the same bcrypt time.
    dummy_hash: String,
}

impl AuthService {
    /// Build the service. Hashes a throwaway password once at the configured
    /// cost to use as the unknown-user comparison target.
    pub fn new(
        authority: TokenAuthority,
        users: Arc<dyn UserRepository>,
        bcrypt_cost: u32,
    ) -> Result<Self, AuthError> {
        let dummy_hash = crypto::hash_password("timing-equalization-placeholder", bcrypt_cost)?;
        Ok(Self {
            authority,
            users,
            bcrypt_cost,
            dummy_hash,
        })
    }

    pub fn authority(&self) -> &TokenAuthority {
        &self.authority
    }

    /// Authenticate by username or email and issue a pair.
    #[instrument(skip_all, name = "auth.service.login")]
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, AuthError> {
        let result = self.login_inner(username_or_email, password).await;
        let (status, category) = outcome_labels(&result);
        record_login(status, category);
        result
    }

    async fn login_inner(
        &self,
        username_or_email: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, AuthError> {
        let login = hash_for_correlation(username_or_email);
        let record = self.users.find_by_username_or_email(username_or_email).await?;

        let hash_to_verify = record
            .as_ref()
            .map_or(self.dummy_hash.as_str(), |r| r.password_hash.as_str());
        let is_valid = crypto::verify_password(password.expose_secret(), hash_to_verify)?;

        let record = match record {
            Some(record) if record.identity.active && is_valid => record,
            Some(record) => {
                tracing::warn!(
                    target: "auth.service",
                    login = %login,
                    reason = if record.identity.active { "bad_password" } else { "inactive" },
                    "Login failed"
                );
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                tracing::warn!(
                    target: "auth.service",
                    login = %login,
                    reason = "unknown_login",
                    "Login failed"
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        let now = chrono::Utc::now();
        let mut identity = record.identity;
        self.users.update_last_login(identity.id, now).await?;
        identity.last_login = Some(now);

        let pair = self.authority.issue_pair_at(&identity, now.timestamp())?;

        tracing::info!(
            target: "auth.service",
            user = %hash_for_correlation(&identity.username),
            role = %identity.role,
            "Login succeeded"
        );
        Ok(auth_response(pair, &identity))
    }

    /// Create a `USER` account and issue a pair for it.
    #[instrument(skip_all, name = "auth.service.register")]
    pub async fn register(&self, registration: Registration) -> Result<AuthResponse, AuthError> {
        let result = self.register_inner(registration).await;
        let (status, category) = outcome_labels(&result);
        record_registration(status, category);
        result
    }

    async fn register_inner(&self, registration: Registration) -> Result<AuthResponse, AuthError> {
        let username = registration.username.trim();
        let email = registration.email.trim();
        let full_name = registration.full_name.trim();

        if username.is_empty() {
            return Err(AuthError::BadRequest("Username cannot be empty".to_string()));
        }
        if !is_valid_email(email) {
            return Err(AuthError::BadRequest("Invalid email format".to_string()));
        }
        if registration.password.expose_secret().len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if full_name.is_empty() {
            return Err(AuthError::BadRequest("Full name cannot be empty".to_string()));
        }

        if self.users.exists_by_username(username).await? {
            return Err(AuthError::CredentialTaken(
                "Username is already taken".to_string(),
            ));
        }
        if self.users.exists_by_email(email).await? {
            return Err(AuthError::CredentialTaken(
                "Email is already registered".to_string(),
            ));
        }

        let password_hash =
            crypto::hash_password(registration.password.expose_secret(), self.bcrypt_cost)?;

        let identity = self
            .users
            .save(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                full_name: full_name.to_string(),
                password_hash,
                role: Role::User,
            })
            .await?;

        let pair = self.authority.issue_pair(&identity)?;

        tracing::info!(
            target: "auth.service",
            user = %hash_for_correlation(&identity.username),
            "User registered"
        );
        Ok(auth_response(pair, &identity))
    }

    /// Rotate: a valid refresh token buys a brand-new pair.
    #[instrument(skip_all, name = "auth.service.refresh")]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let (pair, identity) = self
            .authority
            .refresh(self.users.as_ref(), refresh_token)
            .await?;
        Ok(auth_response(pair, &identity))
    }

    /// Check the bearer header and token. Nothing is revoked; the token stays
    /// valid until it expires.
    #[instrument(skip_all, name = "auth.service.logout")]
    pub fn logout(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let token = require_bearer(authorization)?;
        let claims = self.authority.verify_access(token)?;

        tracing::info!(
            target: "auth.service",
            user = %hash_for_correlation(&claims.sub),
            "Logout acknowledged"
        );
        Ok(())
    }

    /// True only for a bearer header carrying a currently valid access token.
    #[instrument(skip_all, name = "auth.service.validate")]
    pub fn validate(&self, authorization: Option<&str>) -> bool {
        let Ok(token) = require_bearer(authorization) else {
            return false;
        };
        self.authority.verify_access(token).is_ok()
    }

    /// Current profile of the access token's subject.
    #[instrument(skip_all, name = "auth.service.profile")]
    pub async fn profile(&self, authorization: Option<&str>) -> Result<UserInfo, AuthError> {
        let token = require_bearer(authorization)?;
        let claims = self.authority.verify_access(token)?;

        match self.users.find_by_username(&claims.sub).await? {
            Some(record) if record.identity.active => Ok(UserInfo::from(&record.identity)),
            _ => {
                tracing::debug!(
                    target: "auth.service",
                    user = %hash_for_correlation(&claims.sub),
                    "Profile lookup found no active identity"
                );
                Err(AuthError::IdentityNotFound)
            }
        }
    }
}

fn require_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    authorization
        .and_then(bearer_token)
        .ok_or(AuthError::InvalidHeaderFormat)
}

fn auth_response(pair: TokenPair, identity: &Identity) -> AuthResponse {
    AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: pair.expires_in_ms,
        user: UserInfo::from(identity),
    }
}

/// Basic shape check: `local@domain.tld` with no empty parts.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    domain_parts.len() >= 2 && domain_parts.iter().all(|p| !p.is_empty())
}
