//! Hand-rolled backend fakes for service tests.
//!
//! Both deliver synchronously: a write notifies every live subscriber before
//! it returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Identity, ProfileUpdate};
use crate::error::StoreError;
use crate::ports::{
    AuthBackend, AuthError, AuthSession, CollectionSnapshot, DeliveryGate, Document,
    DocumentSnapshot, DocumentStore, SnapshotHandler, Subscription, split_record_path,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub(crate) struct FakeAuthBackend {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    sessions: Mutex<HashMap<String, String>>,
    resets: Mutex<Vec<String>>,
    ended: AtomicUsize,
    issued: AtomicUsize,
    unavailable: AtomicBool,
}

impl FakeAuthBackend {
    pub(crate) fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub(crate) fn ended_sessions(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }

    pub(crate) fn resets(&self) -> Vec<String> {
        lock(&self.resets).clone()
    }

    fn ensure_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AuthError::Unavailable("fake auth offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn open_session(&self, identity: Identity) -> AuthSession {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        let token = format!("token-{}-{n}", identity.id);
        lock(&self.sessions).insert(token.clone(), identity.id.clone());
        AuthSession { identity, token }
    }
}

#[async_trait]
impl AuthBackend for FakeAuthBackend {
    async fn create_identity(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.ensure_available()?;
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < 6 {
            return Err(AuthError::WeakPassword);
        }
        let mut accounts = lock(&self.accounts);
        if accounts.contains_key(email) {
            return Err(AuthError::EmailInUse);
        }
        let identity = Identity::new(format!("uid-{}", accounts.len() + 1), email);
        accounts.insert(email.to_string(), (password.to_string(), identity.clone()));
        drop(accounts);
        Ok(self.open_session(identity))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.ensure_available()?;
        let identity = match lock(&self.accounts).get(email) {
            Some((stored, identity)) if stored == password => identity.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        Ok(self.open_session(identity))
    }

    async fn end_session(&self, token: &str) -> Result<(), AuthError> {
        self.ensure_available()?;
        lock(&self.sessions).remove(token);
        self.ended.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.ensure_available()?;
        if !lock(&self.accounts).contains_key(email) {
            return Err(AuthError::UserNotFound);
        }
        lock(&self.resets).push(email.to_string());
        Ok(())
    }

    async fn update_profile(
        &self,
        identity_id: &str,
        update: ProfileUpdate,
    ) -> Result<Identity, AuthError> {
        self.ensure_available()?;
        let mut accounts = lock(&self.accounts);
        let (_, identity) = accounts
            .values_mut()
            .find(|(_, identity)| identity.id == identity_id)
            .ok_or(AuthError::UserNotFound)?;
        if let Some(name) = update.display_name {
            identity.display_name = Some(name);
        }
        Ok(identity.clone())
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        self.ensure_available()?;
        let Some(identity_id) = lock(&self.sessions).get(token).cloned() else {
            return Ok(None);
        };
        Ok(lock(&self.accounts)
            .values()
            .find(|(_, identity)| identity.id == identity_id)
            .map(|(_, identity)| identity.clone()))
    }
}

type CollectionListener = (DeliveryGate, Arc<SnapshotHandler<CollectionSnapshot>>);

#[derive(Default)]
pub(crate) struct FakeStore {
    records: Mutex<Vec<(String, Document)>>,
    listeners: Mutex<Vec<CollectionListener>>,
    writes: AtomicUsize,
    next_key: AtomicUsize,
    unavailable: AtomicBool,
}

impl FakeStore {
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.records).len()
    }

    /// Insert a raw record, bypassing the repository.
    pub(crate) fn seed(&self, key: &str, data: Document) {
        lock(&self.records).push((key.to_string(), data));
        self.notify();
    }

    /// Go offline and push the failure to every subscriber.
    pub(crate) fn fail(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
        self.notify();
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("fake store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn snapshot(&self) -> Result<CollectionSnapshot, StoreError> {
        self.ensure_available()?;
        Ok(CollectionSnapshot {
            entries: lock(&self.records).clone(),
        })
    }

    fn notify(&self) {
        let listeners: Vec<CollectionListener> = lock(&self.listeners).clone();
        for (gate, handler) in listeners {
            let snapshot = self.snapshot();
            gate.deliver(|| handler(snapshot));
        }
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn push(&self, _collection: &str, data: Document) -> Result<String, StoreError> {
        self.ensure_available()?;
        let key = format!("post-{}", self.next_key.fetch_add(1, Ordering::SeqCst));
        lock(&self.records).push((key.clone(), data));
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.notify();
        Ok(key)
    }

    async fn update(&self, path: &str, partial: Document) -> Result<(), StoreError> {
        self.ensure_available()?;
        let (_, key) = split_record_path(path)?;
        {
            let mut records = lock(&self.records);
            let (_, data) = records
                .iter_mut()
                .find(|(k, _)| k == key)
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            if let (Value::Object(target), Value::Object(fields)) = (data, partial) {
                target.extend(fields);
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.notify();
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        let (_, key) = split_record_path(path)?;
        lock(&self.records).retain(|(k, _)| k != key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.notify();
        Ok(())
    }

    async fn subscribe_collection(
        &self,
        _collection: &str,
        handler: SnapshotHandler<CollectionSnapshot>,
    ) -> Subscription {
        let gate = DeliveryGate::new();
        let handler = Arc::new(handler);
        gate.deliver(|| handler(self.snapshot()));
        lock(&self.listeners).push((gate.clone(), handler));
        Subscription::new(move || gate.close())
    }

    async fn subscribe_document(
        &self,
        path: &str,
        handler: SnapshotHandler<DocumentSnapshot>,
    ) -> Subscription {
        let key = match split_record_path(path) {
            Ok((_, key)) => key.to_string(),
            Err(e) => {
                handler(Err(e));
                return Subscription::noop();
            }
        };
        let per_record: SnapshotHandler<CollectionSnapshot> = Box::new(move |snapshot| {
            handler(snapshot.map(|snapshot| DocumentSnapshot {
                data: snapshot
                    .entries
                    .into_iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, data)| data),
                key: key.clone(),
            }))
        });
        self.subscribe_collection("posts", per_record).await
    }
}
