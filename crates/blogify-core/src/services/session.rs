//! Session store - the owned "who is signed in" state of one client.
//!
//! Lifecycle: `Uninitialized -> Resolving -> Resolved(identity | none)`.
//! Consumers hold the store by `Arc` and either register callbacks with
//! [`SessionStore::on_change`] or watch the state with [`SessionStore::watch`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::domain::{Identity, ProfileUpdate, mask_email};
use crate::ports::{AuthBackend, AuthError, AuthSession, DeliveryGate, Subscription};

/// Authentication state of a client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No check has been made yet.
    Uninitialized,
    /// The initial check with the backend is in flight.
    Resolving,
    /// The backend answered: signed in as the identity, or signed out.
    Resolved(Option<Identity>),
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, SessionState::Resolved(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Resolved(identity) => identity.as_ref(),
            _ => None,
        }
    }
}

type Listener = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    gate: DeliveryGate,
    callback: Listener,
    /// Revision of the last state handed to `callback`.
    delivered: Arc<AtomicU64>,
}

/// Session store wrapping the hosted auth service.
pub struct SessionStore {
    backend: Arc<dyn AuthBackend>,
    state: watch::Sender<SessionState>,
    token: Mutex<Option<String>>,
    last_error: Mutex<Option<String>>,
    listeners: Arc<Mutex<Vec<ListenerEntry>>>,
    next_listener_id: AtomicU64,
    revision: AtomicU64,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            backend,
            state,
            token: Mutex::new(None),
            last_error: Mutex::new(None),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: AtomicU64::new(0),
            revision: AtomicU64::new(0),
        }
    }

    /// Initial check: resolve a previously issued session token, if any.
    ///
    /// A token the backend no longer accepts, or a backend failure, resolves
    /// to "signed out".
    pub async fn initialize(&self, restored_token: Option<&str>) -> SessionState {
        self.publish(SessionState::Resolving);

        let identity = match restored_token {
            Some(token) => match self.backend.resolve_session(token).await {
                Ok(Some(identity)) => {
                    *lock(&self.token) = Some(token.to_string());
                    Some(identity)
                }
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not restore session");
                    None
                }
            },
            None => None,
        };

        match &identity {
            Some(identity) => {
                tracing::info!(email = %mask_email(&identity.email), "Session restored")
            }
            None => tracing::debug!("No active session"),
        }

        let state = SessionState::Resolved(identity);
        self.publish(state.clone());
        state
    }

    /// Create an account, set its display name when given, and sign it in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, AuthError> {
        self.clear_error();

        let AuthSession { identity, token } = self
            .backend
            .create_identity(email, password)
            .await
            .map_err(|e| self.record(registration_error(e)))?;
        tracing::info!(email = %mask_email(email), "Account created");

        let identity = match display_name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => {
                let update = ProfileUpdate {
                    display_name: Some(name.to_string()),
                };
                match self.backend.update_profile(&identity.id, update).await {
                    Ok(updated) => updated,
                    Err(e) => {
                        // The account exists and is signed in even though the name was not set.
                        self.sign_in(identity, token);
                        return Err(self.record(registration_error(e)));
                    }
                }
            }
            None => identity,
        };

        self.sign_in(identity.clone(), token);
        Ok(identity)
    }

    /// Sign in. On failure the current identity is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.clear_error();

        let AuthSession { identity, token } = self
            .backend
            .authenticate(email, password)
            .await
            .map_err(|e| self.record(e))?;

        self.sign_in(identity.clone(), token);
        Ok(identity)
    }

    /// End the current session. Signing out while signed out is a no-op.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.clear_error();

        let token = lock(&self.token).clone();
        if let Some(token) = token {
            self.backend
                .end_session(&token)
                .await
                .map_err(|e| self.record(e))?;
        }
        *lock(&self.token) = None;

        if let Some(identity) = self.current_identity() {
            tracing::info!(email = %mask_email(&identity.email), "User logged out");
        }
        self.publish(SessionState::Resolved(None));
        Ok(())
    }

    /// Ask the backend to email a password reset link.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.clear_error();

        self.backend
            .send_password_reset(email)
            .await
            .map_err(|e| self.record(e))?;
        tracing::info!(email = %mask_email(email), "Password reset requested");
        Ok(())
    }

    /// Register a callback for every session state change.
    ///
    /// When the session is already resolved the callback is invoked with the
    /// current state before this returns.
    pub fn on_change(
        &self,
        callback: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let gate = DeliveryGate::new();
        let callback: Listener = Arc::new(callback);
        let delivered = Arc::new(AtomicU64::new(0));

        // A publish racing this registration either changed the state before
        // it was read here, or sees the new entry once the lock is released.
        let (revision, current) = {
            let mut listeners = lock(&self.listeners);
            let snapshot = self.snapshot();
            listeners.push(ListenerEntry {
                id,
                gate: gate.clone(),
                callback: Arc::clone(&callback),
                delivered: Arc::clone(&delivered),
            });
            snapshot
        };
        if current.is_resolved() {
            deliver_newer(&gate, &delivered, revision, &callback, &current);
        }

        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            gate.close();
            lock(&listeners).retain(|entry| entry.id != id);
        })
    }

    /// Watch the session state.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().identity().is_some()
    }

    /// Token of the current session, if signed in.
    pub fn token(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    /// Message of the last failed operation; cleared when the next one starts.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    fn sign_in(&self, identity: Identity, token: String) {
        tracing::info!(email = %mask_email(&identity.email), "User logged in");
        *lock(&self.token) = Some(token);
        self.publish(SessionState::Resolved(Some(identity)));
    }

    fn publish(&self, state: SessionState) {
        let mut revision = 0;
        let changed = self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state.clone();
                revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
                true
            }
        });
        if !changed {
            return;
        }

        let listeners: Vec<_> = lock(&self.listeners)
            .iter()
            .map(|entry| {
                (
                    entry.gate.clone(),
                    Arc::clone(&entry.delivered),
                    Arc::clone(&entry.callback),
                )
            })
            .collect();
        for (gate, delivered, callback) in listeners {
            deliver_newer(&gate, &delivered, revision, &callback, &state);
        }
    }

    /// Current state with the revision that produced it.
    fn snapshot(&self) -> (u64, SessionState) {
        let state = self.state.borrow();
        (self.revision.load(Ordering::SeqCst), state.clone())
    }

    fn clear_error(&self) {
        *lock(&self.last_error) = None;
    }

    fn record(&self, err: AuthError) -> AuthError {
        tracing::warn!(error = %err, "Auth operation failed");
        *lock(&self.last_error) = Some(err.to_string());
        err
    }
}

/// Registration surfaces `EmailInUse`, `WeakPassword` and `Unavailable` as
/// they are; anything else becomes a generic failure.
fn registration_error(err: AuthError) -> AuthError {
    match err {
        AuthError::EmailInUse | AuthError::WeakPassword | AuthError::Unavailable(_) => err,
        AuthError::Failure(_) => err,
        other => AuthError::Failure(other.to_string()),
    }
}

/// Hand `state` to a listener unless it already saw a later revision.
fn deliver_newer(
    gate: &DeliveryGate,
    delivered: &AtomicU64,
    revision: u64,
    callback: &Listener,
    state: &SessionState,
) {
    gate.deliver(|| {
        if delivered.load(Ordering::SeqCst) < revision {
            delivered.store(revision, Ordering::SeqCst);
            callback(state);
        }
    });
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::FakeAuthBackend;

    fn store() -> (Arc<FakeAuthBackend>, SessionStore) {
        let backend = Arc::new(FakeAuthBackend::default());
        let store = SessionStore::new(backend.clone());
        (backend, store)
    }

    fn recorder(store: &SessionStore) -> (Arc<Mutex<Vec<SessionState>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = store.on_change(move |state| lock(&sink).push(state.clone()));
        (seen, subscription)
    }

    #[tokio::test]
    async fn test_lifecycle_starts_uninitialized() {
        let (_, store) = store();
        assert_eq!(store.state(), SessionState::Uninitialized);

        let state = store.initialize(None).await;
        assert_eq!(state, SessionState::Resolved(None));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_watch_sees_resolution() {
        let (_, store) = store();
        let mut rx = store.watch();
        store.initialize(None).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Resolved(None));
    }

    #[tokio::test]
    async fn test_register_sets_display_name_and_emits() {
        let (_, store) = store();
        store.initialize(None).await;
        let (seen, _subscription) = recorder(&store);

        let identity = store
            .register("a@x.com", "secret1", Some("Alice"))
            .await
            .unwrap();

        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.display_name.as_deref(), Some("Alice"));
        assert_eq!(store.current_identity(), Some(identity.clone()));
        assert!(store.token().is_some());

        let seen = lock(&seen);
        assert_eq!(
            seen.as_slice(),
            [
                SessionState::Resolved(None),
                SessionState::Resolved(Some(identity)),
            ]
        );
    }

    #[tokio::test]
    async fn test_register_without_name() {
        let (_, store) = store();
        let identity = store.register("a@x.com", "secret1", Some("  ")).await.unwrap();
        assert_eq!(identity.display_name, None);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (_, store) = store();
        store.register("a@x.com", "secret1", None).await.unwrap();
        store.logout().await.unwrap();

        let err = store.register("a@x.com", "secret2", None).await.unwrap_err();
        assert_eq!(err, AuthError::EmailInUse);
        assert!(store.last_error().is_some());
        assert_eq!(store.current_identity(), None);
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let (_, store) = store();
        let err = store.register("a@x.com", "123", None).await.unwrap_err();
        assert_eq!(err, AuthError::WeakPassword);
    }

    #[tokio::test]
    async fn test_register_other_failures_become_generic() {
        let (_, store) = store();
        let err = store.register("not-an-email", "secret1", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Failure(_)));
    }

    #[tokio::test]
    async fn test_login_wrong_password_keeps_signed_out() {
        let (_, store) = store();
        store.initialize(None).await;
        store.register("a@x.com", "secret1", None).await.unwrap();
        store.logout().await.unwrap();

        let err = store.login("a@x.com", "wrong").await.unwrap_err();
        assert!(err.is_credential_failure());
        assert_eq!(store.state(), SessionState::Resolved(None));
    }

    #[tokio::test]
    async fn test_login_wrong_password_keeps_previous_identity() {
        let (_, store) = store();
        let alice = store.register("a@x.com", "secret1", None).await.unwrap();

        let err = store.login("a@x.com", "wrong").await.unwrap_err();
        assert!(err.is_credential_failure());
        assert_eq!(store.current_identity(), Some(alice));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (backend, store) = store();
        store.register("a@x.com", "secret1", None).await.unwrap();

        store.logout().await.unwrap();
        store.logout().await.unwrap();
        assert_eq!(store.state(), SessionState::Resolved(None));
        assert_eq!(store.token(), None);
        assert_eq!(backend.ended_sessions(), 1);
    }

    #[tokio::test]
    async fn test_logout_fails_when_backend_down() {
        let (backend, store) = store();
        store.register("a@x.com", "secret1", None).await.unwrap();
        backend.set_available(false);

        let err = store.logout().await.unwrap_err();
        assert!(matches!(err, AuthError::Unavailable(_)));
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_initialize_restores_token() {
        let (backend, store) = store();
        store.register("a@x.com", "secret1", None).await.unwrap();
        let token = store.token().unwrap();

        let restored = SessionStore::new(backend.clone());
        let state = restored.initialize(Some(&token)).await;
        assert_eq!(state.identity().map(|i| i.email.as_str()), Some("a@x.com"));
        assert_eq!(restored.token(), Some(token));
    }

    #[tokio::test]
    async fn test_initialize_with_ended_session_resolves_signed_out() {
        let (backend, store) = store();
        store.register("a@x.com", "secret1", None).await.unwrap();
        let token = store.token().unwrap();
        store.logout().await.unwrap();

        let restored = SessionStore::new(backend);
        assert_eq!(restored.initialize(Some(&token)).await, SessionState::Resolved(None));
    }

    #[tokio::test]
    async fn test_password_reset() {
        let (backend, store) = store();
        store.register("a@x.com", "secret1", None).await.unwrap();

        store.request_password_reset("a@x.com").await.unwrap();
        assert_eq!(backend.resets(), vec!["a@x.com".to_string()]);

        let err = store.request_password_reset("nobody@x.com").await.unwrap_err();
        assert_eq!(err, AuthError::UserNotFound);
    }

    #[tokio::test]
    async fn test_cancelled_listener_receives_nothing() {
        let (_, store) = store();
        let (seen, subscription) = recorder(&store);
        subscription.cancel();

        store.initialize(None).await;
        store.register("a@x.com", "secret1", None).await.unwrap();
        assert!(lock(&seen).is_empty());
    }

    #[tokio::test]
    async fn test_listener_not_called_before_resolution() {
        let (_, store) = store();
        let (seen, _subscription) = recorder(&store);
        assert!(lock(&seen).is_empty());

        store.initialize(None).await;
        assert_eq!(
            lock(&seen).as_slice(),
            [SessionState::Resolving, SessionState::Resolved(None)]
        );
    }

    #[test]
    fn test_listener_registered_during_sign_in_ends_on_latest_state() {
        let (_, store) = store();
        store.publish(SessionState::Resolved(None));
        let alice = Identity::new("uid-1", "a@x.com");

        let shared = &store;
        let recorders = std::thread::scope(|scope| {
            let registrants: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(move || (0..25).map(|_| recorder(shared)).collect::<Vec<_>>())
                })
                .collect();
            scope.spawn(|| {
                for round in 0..50 {
                    let identity = (round % 2 == 0).then(|| alice.clone());
                    store.publish(SessionState::Resolved(identity));
                }
                store.publish(SessionState::Resolved(Some(alice.clone())));
            });
            registrants
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });

        let latest = store.state();
        assert_eq!(latest, SessionState::Resolved(Some(alice)));
        for (seen, _subscription) in &recorders {
            assert_eq!(lock(seen).last(), Some(&latest));
        }
    }
}
