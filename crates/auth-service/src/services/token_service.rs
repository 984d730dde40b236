//! Token authority: issues, verifies and rotates access/refresh tokens.
//!
//! The authority holds the immutable signing configuration built at startup.
//! Every time-dependent operation has an `_at(now)` form taking Unix seconds so
//! expiry boundaries can be tested without sleeping.

use crate::config::Config;
use crate::crypto::TokenSigner;
use crate::errors::AuthError;
use crate::models::{Identity, Role};
use crate::observability::{hash_for_correlation, outcome_labels};
use crate::observability::metrics::{record_refresh, record_token_issuance, record_token_validation};
use crate::repositories::UserRepository;
use common::jwt::{AccessClaims, Claims, RefreshClaims, RefreshMarker, TokenVerifier, VerificationFailure};
use common::secret::SigningSecret;
use common::types::TokenKind;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Access and refresh token minted at the same instant.
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// `exp` of the access token (Unix seconds).
    pub access_expires_at: i64,
    /// `exp` of the refresh token (Unix seconds).
    pub refresh_expires_at: i64,
    /// Access token lifetime in milliseconds, as reported to clients.
    pub expires_in_ms: u64,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .field("expires_in_ms", &self.expires_in_ms)
            .finish()
    }
}

pub struct TokenAuthority {
    signer: TokenSigner,
    verifier: TokenVerifier,
    access_token_ttl_ms: u64,
    refresh_token_ttl_ms: u64,
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("verifier", &self.verifier)
            .field("access_token_ttl_ms", &self.access_token_ttl_ms)
            .field("refresh_token_ttl_ms", &self.refresh_token_ttl_ms)
            .finish_non_exhaustive()
    }
}

fn now_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Whole seconds of a millisecond TTL.
fn ttl_seconds(ttl_ms: u64) -> i64 {
    i64::try_from(ttl_ms / 1000).unwrap_or(i64::MAX)
}

impl TokenAuthority {
    pub fn new(
        secret: &SigningSecret,
        access_token_ttl_ms: u64,
        refresh_token_ttl_ms: u64,
        clock_skew: Duration,
    ) -> Self {
        Self {
            signer: TokenSigner::new(secret),
            verifier: TokenVerifier::new(secret, clock_skew),
            access_token_ttl_ms,
            refresh_token_ttl_ms,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.signing_secret,
            config.access_token_ttl_ms,
            config.refresh_token_ttl_ms,
            config.clock_skew,
        )
    }

    // ------------------------------------------------------------------------
    // Issuance
    // ------------------------------------------------------------------------

    pub fn issue_access_token(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_access_token_at(identity, now_seconds())
    }

    /// Mint an access token carrying the identity's id, email, name and role.
    #[instrument(skip_all, name = "auth.token.issue_access")]
    pub fn issue_access_token_at(&self, identity: &Identity, now: i64) -> Result<String, AuthError> {
        let start = Instant::now();
        let claims = AccessClaims {
            sub: identity.username.clone(),
            iat: now,
            exp: now.saturating_add(ttl_seconds(self.access_token_ttl_ms)),
            user_id: identity.id,
            email: identity.email.clone(),
            full_name: identity.full_name.clone(),
            role: identity.role,
        };

        let result = self.signer.sign(&claims);
        record_token_issuance(
            TokenKind::Access.as_str(),
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );
        result
    }

    pub fn issue_refresh_token(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_refresh_token_at(identity, now_seconds())
    }

    /// Mint a refresh token. It carries only the username, id and `type`.
    #[instrument(skip_all, name = "auth.token.issue_refresh")]
    pub fn issue_refresh_token_at(
        &self,
        identity: &Identity,
        now: i64,
    ) -> Result<String, AuthError> {
        let start = Instant::now();
        let claims = RefreshClaims {
            sub: identity.username.clone(),
            iat: now,
            exp: now.saturating_add(ttl_seconds(self.refresh_token_ttl_ms)),
            user_id: identity.id,
            token_type: RefreshMarker::Refresh,
        };

        let result = self.signer.sign(&claims);
        record_token_issuance(
            TokenKind::Refresh.as_str(),
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );
        result
    }

    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        self.issue_pair_at(identity, now_seconds())
    }

    pub fn issue_pair_at(&self, identity: &Identity, now: i64) -> Result<TokenPair, AuthError> {
        let access_token = self.issue_access_token_at(identity, now)?;
        let refresh_token = self.issue_refresh_token_at(identity, now)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: now.saturating_add(ttl_seconds(self.access_token_ttl_ms)),
            refresh_expires_at: now.saturating_add(ttl_seconds(self.refresh_token_ttl_ms)),
            expires_in_ms: self.access_token_ttl_ms,
        })
    }

    // ------------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------------

    pub fn verify(&self, token: &str) -> Result<Claims, VerificationFailure> {
        self.verify_at(token, now_seconds())
    }

    /// Verify signature, `iat` skew and expiry as of `now`.
    #[instrument(skip_all, name = "auth.token.verify")]
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, VerificationFailure> {
        let result = self.verifier.verify_at(token, now);
        match &result {
            Ok(_) => record_token_validation("success", None),
            Err(failure) => record_token_validation("error", Some(failure.category())),
        }
        result
    }

    /// Verify and require an access token.
    pub fn verify_access_at(
        &self,
        token: &str,
        now: i64,
    ) -> Result<AccessClaims, VerificationFailure> {
        self.verify_at(token, now)?.into_access()
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, VerificationFailure> {
        self.verify_access_at(token, now_seconds())
    }

    // ------------------------------------------------------------------------
    // Rotation
    // ------------------------------------------------------------------------

    pub async fn refresh(
        &self,
        users: &dyn UserRepository,
        refresh_token: &str,
    ) -> Result<(TokenPair, Identity), AuthError> {
        self.refresh_at(users, refresh_token, now_seconds()).await
    }

    /// Exchange a valid refresh token for a brand-new pair.
    ///
    /// The identity is re-read from the store so role changes take effect and
    /// removed or deactivated users are refused. The presented refresh token
    /// is not recorded anywhere and stays usable until its own expiry.
    #[instrument(skip_all, name = "auth.token.refresh")]
    pub async fn refresh_at(
        &self,
        users: &dyn UserRepository,
        refresh_token: &str,
        now: i64,
    ) -> Result<(TokenPair, Identity), AuthError> {
        let result = self.rotate(users, refresh_token, now).await;
        let (status, category) = outcome_labels(&result);
        record_refresh(status, category);
        result
    }

    async fn rotate(
        &self,
        users: &dyn UserRepository,
        refresh_token: &str,
        now: i64,
    ) -> Result<(TokenPair, Identity), AuthError> {
        let claims = match self.verify_at(refresh_token, now).and_then(Claims::into_refresh) {
            Ok(claims) => claims,
            Err(failure) => {
                tracing::debug!(
                    target: "auth.token",
                    reason = failure.category(),
                    "Refresh rejected: token not usable"
                );
                return Err(AuthError::InvalidRefreshToken);
            }
        };

        let user = hash_for_correlation(&claims.sub);
        let record = users.find_by_username(&claims.sub).await?;

        let identity = match record {
            Some(record) if record.identity.active && record.identity.id == claims.user_id => {
                record.identity
            }
            Some(record) => {
                tracing::debug!(
                    target: "auth.token",
                    user = %user,
                    active = record.identity.active,
                    id_matches = record.identity.id == claims.user_id,
                    "Refresh rejected: identity no longer eligible"
                );
                return Err(AuthError::IdentityNotFound);
            }
            None => {
                tracing::debug!(
                    target: "auth.token",
                    user = %user,
                    "Refresh rejected: identity not found"
                );
                return Err(AuthError::IdentityNotFound);
            }
        };

        let pair = self.issue_pair_at(&identity, now)?;

        tracing::info!(target: "auth.token", user = %user, "Token pair refreshed");
        Ok((pair, identity))
    }

    // ------------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------------

    /// Username of any valid token.
    pub fn extract_username(&self, token: &str) -> Result<String, VerificationFailure> {
        Ok(self.verify(token)?.subject().to_string())
    }

    /// Role of a valid access token; refresh tokens fail with `WrongKind`.
    pub fn extract_role(&self, token: &str) -> Result<Role, VerificationFailure> {
        self.verify(token)?.role()
    }

    /// Numeric id of any valid token.
    pub fn extract_user_id(&self, token: &str) -> Result<i64, VerificationFailure> {
        Ok(self.verify(token)?.user_id())
    }

    pub fn extract_email(&self, token: &str) -> Result<String, VerificationFailure> {
        Ok(self.verify(token)?.into_access()?.email)
    }

    /// Display name of a valid access token; refresh tokens fail with `WrongKind`.
    pub fn extract_full_name(&self, token: &str) -> Result<String, VerificationFailure> {
        Ok(self.verify(token)?.into_access()?.full_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{NewUser, UserRecord};
    use crate::repositories::InMemoryUserRepository;
    use common::jwt::DEFAULT_CLOCK_SKEW;

    const SECRET: &str = "token-service-unit-test-secret-0123456789";
    const ACCESS_TTL_MS: u64 = 3_600_000;
    const REFRESH_TTL_MS: u64 = 604_800_000;
    const T0: i64 = 1_700_000_000;

    fn authority() -> TokenAuthority {
        TokenAuthority::new(
            &SigningSecret::from_text(SECRET).unwrap(),
            ACCESS_TTL_MS,
            REFRESH_TTL_MS,
            DEFAULT_CLOCK_SKEW,
        )
    }

    fn alice() -> Identity {
        Identity {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice Admin".to_string(),
            role: Role::Admin,
            active: true,
            last_login: None,
        }
    }

    async fn repo_with(identity: Identity) -> InMemoryUserRepository {
        let repo = InMemoryUserRepository::new();
        repo.insert(UserRecord {
            identity,
            password_hash: "unused".to_string(),
        })
        .await;
        repo
    }

    #[test]
    fn test_access_token_round_trip() {
        let authority = authority();
        let token = authority.issue_access_token_at(&alice(), T0).unwrap();

        let claims = authority.verify_access_at(&token, T0 + 1).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.full_name, "Alice Admin");
        assert_eq!(claims.iat, T0);
        assert_eq!(claims.exp, T0 + 3600);
    }

    #[test]
    fn test_refresh_token_has_refresh_kind_and_long_expiry() {
        let authority = authority();
        let token = authority.issue_refresh_token_at(&alice(), T0).unwrap();

        let claims = authority.verify_at(&token, T0).unwrap();
        assert_eq!(claims.kind(), TokenKind::Refresh);
        assert_eq!(claims.expires_at(), T0 + 604_800);
        assert_eq!(claims.user_id(), 42);
    }

    #[test]
    fn test_issue_pair_mints_both_at_same_instant() {
        let pair = authority().issue_pair_at(&alice(), T0).unwrap();

        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(pair.access_expires_at, T0 + 3600);
        assert_eq!(pair.refresh_expires_at, T0 + 604_800);
        assert_eq!(pair.expires_in_ms, ACCESS_TTL_MS);
    }

    #[test]
    fn test_access_token_expiry_boundary() {
        let authority = authority();
        let token = authority.issue_access_token_at(&alice(), T0).unwrap();

        assert!(authority.verify_at(&token, T0 + 3599).is_ok());
        assert_eq!(
            authority.verify_at(&token, T0 + 3600),
            Err(VerificationFailure::Expired)
        );
    }

    #[test]
    fn test_sub_second_ttl_truncates() {
        let authority = TokenAuthority::new(
            &SigningSecret::from_text(SECRET).unwrap(),
            1_999,
            REFRESH_TTL_MS,
            DEFAULT_CLOCK_SKEW,
        );
        let token = authority.issue_access_token_at(&alice(), T0).unwrap();

        assert_eq!(authority.verify_at(&token, T0).unwrap().expires_at(), T0 + 1);
    }

    #[test]
    fn test_extract_projections() {
        let authority = authority();
        let access = authority.issue_access_token(&alice()).unwrap();
        let refresh = authority.issue_refresh_token(&alice()).unwrap();

        assert_eq!(authority.extract_username(&access).unwrap(), "alice");
        assert_eq!(authority.extract_role(&access).unwrap(), Role::Admin);
        assert_eq!(authority.extract_user_id(&access).unwrap(), 42);

        assert_eq!(authority.extract_username(&refresh).unwrap(), "alice");
        assert_eq!(authority.extract_user_id(&refresh).unwrap(), 42);
        assert!(matches!(
            authority.extract_role(&refresh),
            Err(VerificationFailure::WrongKind { .. })
        ));
    }

    #[test]
    fn test_extract_email_and_full_name_require_access_token() {
        let authority = authority();
        let access = authority.issue_access_token(&alice()).unwrap();
        let refresh = authority.issue_refresh_token(&alice()).unwrap();

        assert_eq!(authority.extract_email(&access).unwrap(), "alice@example.com");
        assert_eq!(authority.extract_full_name(&access).unwrap(), "Alice Admin");
        assert!(matches!(
            authority.extract_email(&refresh),
            Err(VerificationFailure::WrongKind { .. })
        ));
        assert!(matches!(
            authority.extract_full_name(&refresh),
            Err(VerificationFailure::WrongKind { .. })
        ));
    }

    #[test]
    fn test_extract_role_on_garbage_is_malformed() {
        assert_eq!(
            authority().extract_role("garbage"),
            Err(VerificationFailure::Malformed)
        );
    }

    #[test]
    fn test_token_from_other_secret_is_malformed() {
        let other = TokenAuthority::new(
            &SigningSecret::from_text("some-other-secret-entirely-0123456789").unwrap(),
            ACCESS_TTL_MS,
            REFRESH_TTL_MS,
            DEFAULT_CLOCK_SKEW,
        );
        let token = other.issue_access_token_at(&alice(), T0).unwrap();

        assert_eq!(
            authority().verify_at(&token, T0),
            Err(VerificationFailure::Malformed)
        );
    }

    #[test]
    fn test_pair_debug_redacts_tokens() {
        let pair = authority().issue_pair_at(&alice(), T0).unwrap();
        let debug_str = format!("{pair:?}");

        assert!(!debug_str.contains(&pair.access_token));
        assert!(!debug_str.contains(&pair.refresh_token));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_pair_with_later_expiry() {
        let authority = authority();
        let repo = repo_with(alice()).await;
        let original = authority.issue_pair_at(&alice(), T0).unwrap();

        let (rotated, identity) = authority
            .refresh_at(&repo, &original.refresh_token, T0 + 60)
            .await
            .unwrap();

        assert_eq!(identity.id, 42);
        assert!(rotated.access_expires_at > original.access_expires_at);
        assert!(rotated.refresh_expires_at > original.refresh_expires_at);
        let claims = authority.verify_access_at(&rotated.access_token, T0 + 61).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let authority = authority();
        let repo = repo_with(alice()).await;
        let access = authority.issue_access_token_at(&alice(), T0).unwrap();

        let result = authority.refresh_at(&repo, &access, T0 + 1).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_refresh_token() {
        let authority = authority();
        let repo = repo_with(alice()).await;
        let refresh = authority.issue_refresh_token_at(&alice(), T0).unwrap();

        let result = authority.refresh_at(&repo, &refresh, T0 + 604_800).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_missing_identity() {
        let authority = authority();
        let repo = InMemoryUserRepository::new();
        let refresh = authority.issue_refresh_token_at(&alice(), T0).unwrap();

        let result = authority.refresh_at(&repo, &refresh, T0 + 1).await;
        assert!(matches!(result, Err(AuthError::IdentityNotFound)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_deactivated_identity() {
        let authority = authority();
        let repo = repo_with(alice()).await;
        repo.deactivate(42).await;
        let refresh = authority.issue_refresh_token_at(&alice(), T0).unwrap();

        let result = authority.refresh_at(&repo, &refresh, T0 + 1).await;
        assert!(matches!(result, Err(AuthError::IdentityNotFound)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_recreated_username() {
        let authority = authority();
        let repo = InMemoryUserRepository::new();
        // Same username, different id.
        repo.save(NewUser {
            username: "alice".to_string(),
            email: "alice2@example.com".to_string(),
            full_name: "Another Alice".to_string(),
            password_hash: "unused".to_string(),
            role: Role::User,
        })
        .await
        .unwrap();
        let refresh = authority.issue_refresh_token_at(&alice(), T0).unwrap();

        let result = authority.refresh_at(&repo, &refresh, T0 + 1).await;
        assert!(matches!(result, Err(AuthError::IdentityNotFound)));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_change() {
        let authority = authority();
        let mut demoted = alice();
        demoted.role = Role::User;
        let repo = repo_with(demoted).await;
        let refresh = authority.issue_refresh_token_at(&alice(), T0).unwrap();

        let (pair, _) = authority.refresh_at(&repo, &refresh, T0 + 1).await.unwrap();
        let claims = authority.verify_access_at(&pair.access_token, T0 + 1).unwrap();
        assert_eq!(claims.role, Role::User);
    }

    #[tokio::test]
    async fn test_refresh_after_access_expiry_keeps_role_and_extends_expiry() {
        let authority = authority();
        let repo = repo_with(alice()).await;
        let pair = authority.issue_pair_at(&alice(), T0).unwrap();

        let claims = authority.verify_access_at(&pair.access_token, T0).unwrap();
        assert_eq!(claims.role, Role::Admin);

        let expired_at = T0 + ttl_seconds(ACCESS_TTL_MS);
        assert_eq!(
            authority.verify_access_at(&pair.access_token, expired_at),
            Err(VerificationFailure::Expired)
        );

        let (rotated, _) = authority
            .refresh_at(&repo, &pair.refresh_token, expired_at)
            .await
            .unwrap();
        let rotated_claims = authority
            .verify_access_at(&rotated.access_token, expired_at)
            .unwrap();
        assert_eq!(rotated_claims.role, Role::Admin);
        assert!(rotated_claims.exp > claims.exp);

        let result = authority
            .refresh_at(&repo, &rotated.access_token, expired_at)
            .await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_old_refresh_token_still_usable_after_rotation() {
        let authority = authority();
        let repo = repo_with(alice()).await;
        let original = authority.issue_pair_at(&alice(), T0).unwrap();

        authority
            .refresh_at(&repo, &original.refresh_token, T0 + 10)
            .await
            .unwrap();
        let second = authority
            .refresh_at(&repo, &original.refresh_token, T0 + 20)
            .await;

        assert!(second.is_ok());
    }
}
