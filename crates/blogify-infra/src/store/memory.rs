//! In-memory realtime document store.
//!
//! Each collection is a `watch` channel holding its full state; every
//! subscription runs a task that forwards the latest state to its handler.
//! Intermediate states may be coalesced, the latest one is always delivered.
//! Works within a single process only.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use blogify_core::StoreError;
use blogify_core::ports::{
    CollectionSnapshot, DeliveryGate, Document, DocumentSnapshot, DocumentStore, SnapshotHandler,
    Subscription, split_record_path,
};

#[derive(Debug, Clone, Default)]
struct CollectionState {
    records: Arc<Vec<(String, Document)>>,
    fault: Option<StoreError>,
}

impl CollectionState {
    fn snapshot(&self) -> Result<CollectionSnapshot, StoreError> {
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(CollectionSnapshot {
                entries: self.records.as_ref().clone(),
            }),
        }
    }

    fn record(&self, key: &str) -> Result<Option<Document>, StoreError> {
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(self
                .records
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, data)| data.clone())),
        }
    }
}

type Collection = Arc<watch::Sender<CollectionState>>;

/// In-memory document store with live subscriptions.
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    available: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage. Subscribers receive the failure while offline and
    /// the current state again once restored.
    pub async fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        let fault = (!available).then(offline);
        for collection in self.collections.read().await.values() {
            collection.send_modify(|state| state.fault = fault.clone());
        }
        tracing::warn!(available, "Document store availability changed");
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(offline())
        }
    }

    async fn existing(&self, collection: &str) -> Option<Collection> {
        self.collections.read().await.get(collection).cloned()
    }

    async fn collection(&self, collection: &str) -> Collection {
        if let Some(existing) = self.existing(collection).await {
            return existing;
        }
        let fault = (!self.available.load(Ordering::SeqCst)).then(offline);
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_insert_with(|| {
                Arc::new(watch::channel(CollectionState {
                    records: Arc::default(),
                    fault,
                })
                .0)
            })
            .clone()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn offline() -> StoreError {
    StoreError::Unavailable("document store offline".to_string())
}

fn validate_collection(collection: &str) -> Result<(), StoreError> {
    if collection.is_empty() || collection.contains('/') {
        return Err(StoreError::InvalidPath(collection.to_string()));
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn push(&self, collection: &str, data: Document) -> Result<String, StoreError> {
        self.ensure_available()?;
        validate_collection(collection)?;

        let key = Uuid::new_v4().simple().to_string();
        self.collection(collection).await.send_modify(|state| {
            Arc::make_mut(&mut state.records).push((key.clone(), data));
        });

        tracing::debug!(collection = %collection, key = %key, "Record pushed");
        Ok(key)
    }

    async fn update(&self, path: &str, partial: Document) -> Result<(), StoreError> {
        self.ensure_available()?;
        let (collection, key) = split_record_path(path)?;
        let Value::Object(fields) = partial else {
            return Err(StoreError::Serialization(
                "partial update must be an object".to_string(),
            ));
        };
        let not_found = || StoreError::NotFound(path.to_string());
        let sender = self.existing(collection).await.ok_or_else(not_found)?;

        let updated = sender.send_if_modified(|state| {
            let records = Arc::make_mut(&mut state.records);
            match records.iter_mut().find(|(k, _)| k == key) {
                Some((_, Value::Object(target))) => {
                    target.extend(fields);
                    true
                }
                Some((_, data)) => {
                    *data = Value::Object(fields);
                    true
                }
                None => false,
            }
        });
        if !updated {
            return Err(not_found());
        }

        tracing::debug!(path = %path, "Record updated");
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        let (collection, key) = split_record_path(path)?;
        let Some(sender) = self.existing(collection).await else {
            return Ok(());
        };

        let removed = sender.send_if_modified(|state| {
            let Some(index) = state.records.iter().position(|(k, _)| k == key) else {
                return false;
            };
            Arc::make_mut(&mut state.records).remove(index);
            true
        });

        tracing::debug!(path = %path, removed, "Record removed");
        Ok(())
    }

    async fn subscribe_collection(
        &self,
        collection: &str,
        handler: SnapshotHandler<CollectionSnapshot>,
    ) -> Subscription {
        if let Err(e) = validate_collection(collection) {
            handler(Err(e));
            return Subscription::noop();
        }
        let mut rx = self.collection(collection).await.subscribe();
        let gate = DeliveryGate::new();
        let task_gate = gate.clone();
        let name = collection.to_string();

        let task = tokio::spawn(async move {
            loop {
                let snapshot = rx.borrow_and_update().snapshot();
                task_gate.deliver(|| handler(snapshot));
                if rx.changed().await.is_err() {
                    break;
                }
            }
            tracing::debug!(collection = %name, "Collection feed closed");
        });

        Subscription::new(move || {
            gate.close();
            task.abort();
        })
    }

    async fn subscribe_document(
        &self,
        path: &str,
        handler: SnapshotHandler<DocumentSnapshot>,
    ) -> Subscription {
        let (collection, key) = match split_record_path(path) {
            Ok((collection, key)) => (collection.to_string(), key.to_string()),
            Err(e) => {
                handler(Err(e));
                return Subscription::noop();
            }
        };
        let mut rx = self.collection(&collection).await.subscribe();
        let gate = DeliveryGate::new();
        let task_gate = gate.clone();

        let task = tokio::spawn(async move {
            let mut last: Option<Result<Option<Document>, StoreError>> = None;
            loop {
                let record = rx.borrow_and_update().record(&key);
                // Changes to sibling records are not this record's changes.
                if last.as_ref() != Some(&record) {
                    last = Some(record.clone());
                    let snapshot = record.map(|data| DocumentSnapshot {
                        key: key.clone(),
                        data,
                    });
                    task_gate.deliver(|| handler(snapshot));
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });

        Subscription::new(move || {
            gate.close();
            task.abort();
        })
    }
}
