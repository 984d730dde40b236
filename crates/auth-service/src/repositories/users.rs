//! Credential store interface and the bundled in-memory implementation.
//!
//! The token core only reads identities through [`UserRepository`]; a real
//! deployment backs it with its own persistence.

use crate::errors::AuthError;
use crate::models::{Identity, NewUser, UserRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Lookups used by login, registration, refresh and profile.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError>;

    /// Match `login` against username first, then email.
    async fn find_by_username_or_email(
        &self,
        login: &str,
    ) -> Result<Option<UserRecord>, AuthError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError>;

    /// Persist a new user and return its identity with the assigned id.
    ///
    /// Fails with `CredentialTaken` if the username or email is already used.
    async fn save(&self, user: NewUser) -> Result<Identity, AuthError>;

    async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), AuthError>;
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, UserRecord>,
}

/// Process-local store; ids are assigned sequentially from 1.
#[derive(Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Inner>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record with a caller-chosen id, replacing any existing one.
    pub async fn insert(&self, record: UserRecord) {
        let mut inner = self.inner.write().await;
        let id = record.identity.id;
        inner.next_id = inner.next_id.max(id);
        inner.users.insert(id, record);
    }

    /// Mark a user inactive. Returns false if the id is unknown.
    pub async fn deactivate(&self, id: i64) -> bool {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(record) => {
                record.identity.active = false;
                true
            }
            None => false,
        }
    }

    /// Remove a user. Returns false if the id is unknown.
    pub async fn delete(&self, id: i64) -> bool {
        self.inner.write().await.users.remove(&id).is_some()
    }

    /// Look a user up by id.
    pub async fn find_by_id(&self, id: i64) -> Option<UserRecord> {
        self.inner.read().await.users.get(&id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|r| r.identity.username == username)
            .cloned())
    }

    async fn find_by_username_or_email(
        &self,
        login: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        let inner = self.inner.read().await;
        let by_username = inner.users.values().find(|r| r.identity.username == login);
        let found = by_username.or_else(|| inner.users.values().find(|r| r.identity.email == login));
        Ok(found.cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().any(|r| r.identity.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().any(|r| r.identity.email == email))
    }

    async fn save(&self, user: NewUser) -> Result<Identity, AuthError> {
        let mut inner = self.inner.write().await;

        // Uniqueness is re-checked under the write lock.
        if inner
            .users
            .values()
            .any(|r| r.identity.username == user.username)
        {
            return Err(AuthError::CredentialTaken(
                "Username is already taken".to_string(),
            ));
        }
        if inner.users.values().any(|r| r.identity.email == user.email) {
            return Err(AuthError::CredentialTaken(
                "Email is already registered".to_string(),
            ));
        }

        inner.next_id += 1;
        let identity = Identity {
            id: inner.next_id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            active: true,
            last_login: None,
        };
        inner.users.insert(
            identity.id,
            UserRecord {
                identity: identity.clone(),
                password_hash: user.password_hash,
            },
        );

        Ok(identity)
    }

    async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), AuthError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .users
            .get_mut(&id)
            .ok_or(AuthError::IdentityNotFound)?;
        record.identity.last_login = Some(at);
        Ok(())
    }
}
