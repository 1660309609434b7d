//! Application state - shared across all handlers.

use std::sync::Arc;

use blogify_core::PostRepository;
use blogify_core::ports::{AuthBackend, DocumentStore, TokenService};
use blogify_infra::{
    Argon2PasswordService, InMemoryAuthBackend, InMemoryDocumentStore, JwtTokenService,
};

#[cfg(feature = "rate-limit")]
use blogify_core::ports::RateLimiter;
#[cfg(feature = "rate-limit")]
use blogify_infra::InMemoryRateLimiter;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<dyn AuthBackend>,
    pub posts: Arc<PostRepository>,
    /// Lifetime of issued session tokens, in seconds.
    pub token_ttl_secs: u64,
    #[cfg(feature = "rate-limit")]
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Wire the in-process auth backend and document store.
    pub fn in_memory(config: AppConfig) -> Self {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
        let token_ttl_secs = tokens.expiration_seconds().max(0) as u64;
        let auth = Arc::new(InMemoryAuthBackend::new(
            tokens,
            Arc::new(Argon2PasswordService::new()),
        ));
        let store = Arc::new(InMemoryDocumentStore::new());

        tracing::info!(
            project_id = %config.backend.project_id,
            auth_domain = %config.backend.auth_domain,
            "Using in-memory auth backend and document store"
        );

        Self::with_backends(config, auth, store, token_ttl_secs)
    }

    /// Build the state around explicit backends.
    pub fn with_backends(
        config: AppConfig,
        auth: Arc<dyn AuthBackend>,
        store: Arc<dyn DocumentStore>,
        token_ttl_secs: u64,
    ) -> Self {
        Self {
            config: Arc::new(config),
            auth,
            posts: Arc::new(PostRepository::new(store)),
            token_ttl_secs,
            #[cfg(feature = "rate-limit")]
            rate_limiter: Arc::new(InMemoryRateLimiter::from_env()),
        }
    }
}
