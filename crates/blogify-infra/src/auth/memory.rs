//! In-process stand-in for the hosted auth service.
//!
//! Accounts live in memory, passwords are Argon2 hashes and sessions are JWTs
//! whose session id is revoked on sign-out. Password reset emails are queued
//! in an outbox instead of being sent.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogify_core::domain::{Identity, ProfileUpdate, mask_email};
use blogify_core::ports::{AuthBackend, AuthError, AuthSession, PasswordService, TokenService};

struct Account {
    password_hash: String,
    identity: Identity,
}

/// In-memory auth backend. Emails are matched case-insensitively.
pub struct InMemoryAuthBackend {
    accounts: RwLock<HashMap<String, Account>>,
    revoked: RwLock<HashSet<String>>,
    outbox: RwLock<Vec<String>>,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
    available: AtomicBool,
}

impl InMemoryAuthBackend {
    pub fn new(tokens: Arc<dyn TokenService>, passwords: Arc<dyn PasswordService>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashSet::new()),
            outbox: RwLock::new(Vec::new()),
            tokens,
            passwords,
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: every call fails with `Unavailable` until restored.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        tracing::warn!(available, "Auth backend availability changed");
    }

    /// Addresses password reset emails were sent to, oldest first.
    pub async fn sent_password_resets(&self) -> Vec<String> {
        self.outbox.read().await.clone()
    }

    fn ensure_available(&self) -> Result<(), AuthError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthError::Unavailable("auth service offline".to_string()))
        }
    }

    fn open_session(&self, identity: Identity) -> Result<AuthSession, AuthError> {
        let token = self.tokens.generate_token(&identity.id, &identity.email)?;
        Ok(AuthSession { identity, token })
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid && !email.contains(char::is_whitespace) {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

#[async_trait]
impl AuthBackend for InMemoryAuthBackend {
    async fn create_identity(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.ensure_available()?;
        let email = normalize_email(email)?;
        self.passwords.check_strength(password)?;

        if self.accounts.read().await.contains_key(&email) {
            return Err(AuthError::EmailInUse);
        }
        let password_hash = self.passwords.hash(password)?;

        let mut identity = Identity::new(Uuid::new_v4().to_string(), email.clone());
        identity.last_sign_in_at = Some(identity.created_at);

        {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&email) {
                return Err(AuthError::EmailInUse);
            }
            accounts.insert(
                email.clone(),
                Account {
                    password_hash,
                    identity: identity.clone(),
                },
            );
        }

        tracing::info!(identity_id = %identity.id, email = %mask_email(&email), "Identity created");
        self.open_session(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.ensure_available()?;
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;

        let password_hash = match self.accounts.read().await.get(&email) {
            Some(account) => account.password_hash.clone(),
            None => return Err(AuthError::InvalidCredentials),
        };
        if !self.passwords.verify(password, &password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = {
            let mut accounts = self.accounts.write().await;
            let account = accounts
                .get_mut(&email)
                .ok_or(AuthError::InvalidCredentials)?;
            account.identity.last_sign_in_at = Some(Utc::now());
            account.identity.clone()
        };

        tracing::debug!(identity_id = %identity.id, "Signed in");
        self.open_session(identity)
    }

    async fn end_session(&self, token: &str) -> Result<(), AuthError> {
        self.ensure_available()?;
        match self.tokens.validate_token(token) {
            Ok(claims) => {
                self.revoked.write().await.insert(claims.session_id);
                tracing::debug!(identity_id = %claims.identity_id, "Session ended");
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring sign-out of an invalid session"),
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.ensure_available()?;
        let email = normalize_email(email)?;
        if !self.accounts.read().await.contains_key(&email) {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(email = %mask_email(&email), "Password reset email queued");
        self.outbox.write().await.push(email);
        Ok(())
    }

    async fn update_profile(
        &self,
        identity_id: &str,
        update: ProfileUpdate,
    ) -> Result<Identity, AuthError> {
        self.ensure_available()?;
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .values_mut()
            .find(|account| account.identity.id == identity_id)
            .ok_or(AuthError::UserNotFound)?;

        if let Some(name) = update.display_name {
            account.identity.display_name = Some(name);
        }
        Ok(account.identity.clone())
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        self.ensure_available()?;
        let claims = match self.tokens.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                return Ok(None);
            }
        };
        if self.revoked.read().await.contains(&claims.session_id) {
            return Ok(None);
        }

        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.identity.id == claims.identity_id)
            .map(|account| account.identity.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

    fn backend() -> InMemoryAuthBackend {
        let tokens = JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            ..JwtConfig::default()
        });
        let passwords = Argon2PasswordService::with_params(1024, 1, 1).unwrap();
        InMemoryAuthBackend::new(Arc::new(tokens), Arc::new(passwords))
    }

    #[tokio::test]
    async fn test_register_then_resolve() {
        let backend = backend();

        let session = backend
            .create_identity("Alice@Example.com", "secret1")
            .await
            .unwrap();

        assert_eq!(session.identity.email, "alice@example.com");
        assert!(session.identity.last_sign_in_at.is_some());
        let resolved = backend.resolve_session(&session.token).await.unwrap();
        assert_eq!(resolved, Some(session.identity));
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let backend = backend();
        backend.create_identity("a@x.com", "secret1").await.unwrap();

        assert_eq!(
            backend.create_identity("A@X.com", "secret2").await.unwrap_err(),
            AuthError::EmailInUse
        );
        assert_eq!(
            backend.create_identity("b@x.com", "123").await.unwrap_err(),
            AuthError::WeakPassword
        );
        assert_eq!(
            backend.create_identity("not-an-email", "secret1").await.unwrap_err(),
            AuthError::InvalidEmail
        );
    }

    #[tokio::test]
    async fn test_login_does_not_reveal_unknown_email() {
        let backend = backend();
        backend.create_identity("a@x.com", "secret1").await.unwrap();

        assert_eq!(
            backend.authenticate("a@x.com", "wrong!!").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            backend.authenticate("nobody@x.com", "secret1").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert!(backend.authenticate("a@x.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn test_end_session_revokes_only_that_session() {
        let backend = backend();
        let first = backend.create_identity("a@x.com", "secret1").await.unwrap();
        let second = backend.authenticate("a@x.com", "secret1").await.unwrap();

        backend.end_session(&first.token).await.unwrap();
        backend.end_session(&first.token).await.unwrap();
        backend.end_session("garbage").await.unwrap();

        assert_eq!(backend.resolve_session(&first.token).await.unwrap(), None);
        assert!(backend.resolve_session(&second.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let backend = backend();
        let session = backend.create_identity("a@x.com", "secret1").await.unwrap();

        let updated = backend
            .update_profile(
                &session.identity.id,
                ProfileUpdate {
                    display_name: Some("Alice".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.label(), "Alice");
        let resolved = backend.resolve_session(&session.token).await.unwrap();
        assert_eq!(resolved.unwrap().display_name.as_deref(), Some("Alice"));
        assert_eq!(
            backend
                .update_profile("missing", ProfileUpdate::default())
                .await
                .unwrap_err(),
            AuthError::UserNotFound
        );
    }

    #[tokio::test]
    async fn test_password_reset_outbox() {
        let backend = backend();
        backend.create_identity("a@x.com", "secret1").await.unwrap();

        backend.send_password_reset(" A@x.com ").await.unwrap();
        assert_eq!(
            backend.send_password_reset("b@x.com").await.unwrap_err(),
            AuthError::UserNotFound
        );

        assert_eq!(backend.sent_password_resets().await, vec!["a@x.com".to_string()]);
    }

    #[tokio::test]
    async fn test_outage() {
        let backend = backend();
        backend.set_available(false);

        assert!(matches!(
            backend.create_identity("a@x.com", "secret1").await,
            Err(AuthError::Unavailable(_))
        ));

        backend.set_available(true);
        assert!(backend.create_identity("a@x.com", "secret1").await.is_ok());
    }
}
