//! Realtime document store port.
//!
//! Records live at `<collection>/<key>` paths. Subscriptions deliver full
//! snapshots, never deltas: every notification carries the complete current
//! state of the collection or record.

use async_trait::async_trait;

use super::Subscription;
use crate::error::StoreError;

/// A stored JSON document.
pub type Document = serde_json::Value;

/// Full state of a collection, in collection iteration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSnapshot {
    pub entries: Vec<(String, Document)>,
}

impl CollectionSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State of a single record; `data` is `None` when it does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub key: String,
    pub data: Option<Document>,
}

/// Callback receiving every snapshot, or the error that interrupted the feed.
pub type SnapshotHandler<T> = Box<dyn Fn(Result<T, StoreError>) + Send + Sync>;

/// Realtime document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Append a record under a generated key and return the key.
    async fn push(&self, collection: &str, data: Document) -> Result<String, StoreError>;

    /// Shallow-merge the fields of `partial` into an existing record.
    async fn update(&self, path: &str, partial: Document) -> Result<(), StoreError>;

    /// Remove a record. Removing a missing record succeeds.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Listen to every change of a collection.
    async fn subscribe_collection(
        &self,
        collection: &str,
        handler: SnapshotHandler<CollectionSnapshot>,
    ) -> Subscription;

    /// Listen to every change of one record.
    async fn subscribe_document(
        &self,
        path: &str,
        handler: SnapshotHandler<DocumentSnapshot>,
    ) -> Subscription;
}

/// Path of record `key` in `collection`.
pub fn record_path(collection: &str, key: &str) -> String {
    format!("{collection}/{key}")
}

/// Split a record path into collection and key.
pub fn split_record_path(path: &str) -> Result<(&str, &str), StoreError> {
    match path.split_once('/') {
        Some((collection, key))
            if !collection.is_empty() && !key.is_empty() && !key.contains('/') =>
        {
            Ok((collection, key))
        }
        _ => Err(StoreError::InvalidPath(path.to_string())),
    }
}
