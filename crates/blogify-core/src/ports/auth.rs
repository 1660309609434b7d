//! Authentication ports: the hosted auth service and the primitives an
//! implementation of it is built from.

use async_trait::async_trait;

use crate::domain::{Identity, ProfileUpdate};

/// A signed-in identity together with the session token the backend issued.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub identity: Identity,
    pub token: String,
}

/// Hosted authentication service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Register a new identity and sign it in.
    async fn create_identity(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Sign in with email and password.
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// End the session identified by `token`. Ending an unknown session is not an error.
    async fn end_session(&self, token: &str) -> Result<(), AuthError>;

    /// Send an out-of-band password reset email.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Change profile fields of an existing identity.
    async fn update_profile(
        &self,
        identity_id: &str,
        update: ProfileUpdate,
    ) -> Result<Identity, AuthError>;

    /// Identity behind a previously issued token, or `None` if the session
    /// is no longer valid.
    async fn resolve_session(&self, token: &str) -> Result<Option<Identity>, AuthError>;
}

/// Claims carried by a session token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub identity_id: String,
    pub email: String,
    pub session_id: String,
    pub exp: i64,
}

/// Session token issuing and validation.
pub trait TokenService: Send + Sync {
    /// Issue a token for a new session of `identity_id`.
    fn generate_token(&self, identity_id: &str, email: &str) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Reject passwords the backend considers too weak.
    fn check_strength(&self, password: &str) -> Result<(), AuthError>;

    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Email already in use")]
    EmailInUse,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Authentication failed: {0}")]
    Failure(String),

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Whether the error means the supplied credentials were rejected.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::UserNotFound | AuthError::InvalidEmail
        )
    }
}
