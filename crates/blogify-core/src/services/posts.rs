//! Post repository - CRUD and live queries over the `posts` collection.
//!
//! Sorting and limiting happen client-side on every snapshot. Subscriptions
//! never surface backend errors: a failed feed degrades to an empty list
//! (or `None` for a single post).

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::clock::{Clock, MonotonicClock};
use crate::domain::{Identity, NewPost, Post, PostPatch, sort_newest_first};
use crate::error::{DomainError, StoreError};
use crate::ports::{
    CollectionSnapshot, Document, DocumentSnapshot, DocumentStore, Subscription, record_path,
};

pub const POSTS_COLLECTION: &str = "posts";

/// Post repository backed by the realtime document store.
pub struct PostRepository {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(store, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a post authored by `author` and return its id.
    ///
    /// Nothing is written unless an author is present and both fields are
    /// non-empty after trimming.
    pub async fn create(
        &self,
        author: Option<&Identity>,
        title: &str,
        content: &str,
    ) -> Result<String, DomainError> {
        let author = author.ok_or(DomainError::NotAuthenticated)?;
        let post = NewPost::new(author, title, content, self.clock.now())?;
        let data =
            serde_json::to_value(&post).map_err(|e| DomainError::Internal(e.to_string()))?;

        let id = self.store.push(POSTS_COLLECTION, data).await?;
        tracing::info!(post_id = %id, author_id = %author.id, "Post created");
        Ok(id)
    }

    /// Merge `patch` into an existing post and refresh `updatedAt`.
    pub async fn update(&self, post_id: &str, patch: PostPatch) -> Result<(), DomainError> {
        if post_id.trim().is_empty() {
            return Err(post_not_found(post_id));
        }
        let fields = patch.validated()?.into_fields(self.clock.now());

        self.store
            .update(&record_path(POSTS_COLLECTION, post_id), Value::Object(fields))
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) | StoreError::InvalidPath(_) => post_not_found(post_id),
                other => other.into(),
            })?;
        tracing::info!(post_id = %post_id, "Post updated");
        Ok(())
    }

    /// Permanently remove a post.
    pub async fn delete(&self, post_id: &str) -> Result<(), DomainError> {
        if post_id.trim().is_empty() {
            return Err(DomainError::Validation("Post ID is required".to_string()));
        }

        self.store
            .remove(&record_path(POSTS_COLLECTION, post_id))
            .await?;
        tracing::info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    /// Live, newest-first list of every post.
    pub async fn subscribe_all(
        &self,
        on_change: impl Fn(Vec<Post>) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_sorted(None, on_change).await
    }

    /// Live list of the `limit` newest posts.
    pub async fn subscribe_recent(
        &self,
        limit: usize,
        on_change: impl Fn(Vec<Post>) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_sorted(Some(limit), on_change).await
    }

    /// Live view of one post; `None` while it does not exist.
    pub async fn subscribe_one(
        &self,
        post_id: &str,
        on_change: impl Fn(Option<Post>) + Send + Sync + 'static,
    ) -> Subscription {
        if post_id.trim().is_empty() {
            on_change(None);
            return Subscription::noop();
        }

        self.store
            .subscribe_document(
                &record_path(POSTS_COLLECTION, post_id),
                Box::new(move |snapshot| on_change(materialize_one(snapshot))),
            )
            .await
    }

    /// Current newest-first list of every post.
    pub async fn snapshot_all(&self) -> Vec<Post> {
        self.snapshot_recent(None).await
    }

    /// Current newest-first list, truncated to `limit` when given.
    pub async fn snapshot_recent(&self, limit: Option<usize>) -> Vec<Post> {
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let subscription = self
            .subscribe_sorted(limit, move |posts| {
                if let Some(tx) = tx.lock().unwrap_or_else(PoisonError::into_inner).take() {
                    let _ = tx.send(posts);
                }
            })
            .await;

        let posts = rx.await.unwrap_or_default();
        subscription.cancel();
        posts
    }

    /// Current state of one post.
    pub async fn get(&self, post_id: &str) -> Option<Post> {
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let subscription = self
            .subscribe_one(post_id, move |post| {
                if let Some(tx) = tx.lock().unwrap_or_else(PoisonError::into_inner).take() {
                    let _ = tx.send(post);
                }
            })
            .await;

        let post = rx.await.ok().flatten();
        subscription.cancel();
        post
    }

    async fn subscribe_sorted(
        &self,
        limit: Option<usize>,
        on_change: impl Fn(Vec<Post>) + Send + Sync + 'static,
    ) -> Subscription {
        self.store
            .subscribe_collection(
                POSTS_COLLECTION,
                Box::new(move |snapshot| on_change(materialize_sorted(snapshot, limit))),
            )
            .await
    }
}

fn post_not_found(post_id: &str) -> DomainError {
    DomainError::NotFound {
        entity_type: "Post",
        id: post_id.to_string(),
    }
}

fn materialize_sorted(
    snapshot: Result<CollectionSnapshot, StoreError>,
    limit: Option<usize>,
) -> Vec<Post> {
    let snapshot = match snapshot {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(error = %e, "Error fetching posts");
            return Vec::new();
        }
    };

    let mut posts: Vec<Post> = snapshot
        .entries
        .into_iter()
        .filter_map(|(id, data)| decode_post(id, data))
        .collect();
    sort_newest_first(&mut posts);
    if let Some(limit) = limit {
        posts.truncate(limit);
    }

    tracing::debug!(count = posts.len(), "Fetched posts");
    posts
}

fn materialize_one(snapshot: Result<DocumentSnapshot, StoreError>) -> Option<Post> {
    match snapshot {
        Ok(DocumentSnapshot { key, data }) => data.and_then(|data| decode_post(key, data)),
        Err(e) => {
            tracing::error!(error = %e, "Error fetching post");
            None
        }
    }
}

fn decode_post(id: String, data: Document) -> Option<Post> {
    match serde_json::from_value::<Post>(data) {
        Ok(mut post) => {
            post.id = id;
            Some(post)
        }
        Err(e) => {
            tracing::warn!(post_id = %id, error = %e, "Skipping malformed post");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::FakeStore;
    use serde_json::json;

    type Seen<T> = Arc<Mutex<Vec<T>>>;

    fn repo() -> (Arc<FakeStore>, PostRepository) {
        let store = Arc::new(FakeStore::default());
        (store.clone(), PostRepository::new(store))
    }

    fn alice() -> Identity {
        Identity::new("uid-alice", "a@x.com").with_display_name("Alice")
    }

    fn recorder<T: Send + 'static>() -> (Seen<T>, impl Fn(T) + Send + Sync + 'static) {
        let seen: Seen<T> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value| sink.lock().unwrap().push(value))
    }

    fn raw_post(title: &str, created_at: Option<i64>) -> Document {
        let mut doc = json!({ "title": title, "content": "body", "authorId": "uid-bob" });
        if let Some(ts) = created_at {
            doc["createdAt"] = json!(ts);
        }
        doc
    }

    #[tokio::test]
    async fn test_create_sets_author() {
        let (_, repo) = repo();
        let author = alice();

        let id = repo.create(Some(&author), " Hi ", "World").await.unwrap();
        let post = repo.get(&id).await.unwrap();

        assert_eq!(post.id, id);
        assert_eq!(post.title, "Hi");
        assert_eq!(post.content, "World");
        assert_eq!(post.author_id, author.id);
        assert_eq!(post.author_email, "a@x.com");
        assert_eq!(post.author_name, "Alice");
        assert!(post.created_at.is_some());
        assert_eq!(post.created_at, post.updated_at);
    }

    #[tokio::test]
    async fn test_create_requires_author() {
        let (store, repo) = repo();
        let err = repo.create(None, "Hi", "World").await.unwrap_err();
        assert!(matches!(err, DomainError::NotAuthenticated));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields_without_writing() {
        let (store, repo) = repo();
        let author = alice();

        for (title, content) in [("", "World"), ("Hi", "   "), (" \n", "\t")] {
            let err = repo.create(Some(&author), title, content).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_all_orders_newest_first() {
        let (store, repo) = repo();
        store.seed("a", raw_post("oldest", Some(100)));
        store.seed("b", raw_post("no-date", None));
        store.seed("c", raw_post("newest", Some(300)));
        store.seed("d", raw_post("middle", Some(200)));

        let (seen, on_change) = recorder::<Vec<Post>>();
        let _subscription = repo.subscribe_all(on_change).await;

        let seen = seen.lock().unwrap();
        let titles: Vec<&str> = seen[0].iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["newest", "middle", "oldest", "no-date"]);
    }

    #[tokio::test]
    async fn test_subscribe_all_tracks_collection_size() {
        let (store, repo) = repo();
        let author = alice();
        let (seen, on_change) = recorder::<Vec<Post>>();
        let _subscription = repo.subscribe_all(on_change).await;

        let first = repo.create(Some(&author), "one", "1").await.unwrap();
        repo.create(Some(&author), "two", "2").await.unwrap();
        assert_eq!(seen.lock().unwrap().last().unwrap().len(), store.len());

        repo.delete(&first).await.unwrap();
        let seen = seen.lock().unwrap();
        let latest = seen.last().unwrap();
        assert_eq!(latest.len(), 1);
        assert!(latest.iter().all(|p| p.id != first));
    }

    #[tokio::test]
    async fn test_subscribe_recent_truncates() {
        let (store, repo) = repo();
        for (key, ts) in [("a", 1), ("b", 2), ("c", 3)] {
            store.seed(key, raw_post(key, Some(ts)));
        }

        let (seen, on_change) = recorder::<Vec<Post>>();
        let _subscription = repo.subscribe_recent(2, on_change).await;

        let seen = seen.lock().unwrap();
        let ids: Vec<&str> = seen[0].iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["c", "b"]);
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let (store, repo) = repo();
        store.seed("good", raw_post("ok", Some(1)));
        store.seed("bad", json!("not a post"));

        let posts = repo.snapshot_all().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "good");
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at() {
        let (_, repo) = repo();
        let author = alice();
        let id = repo.create(Some(&author), "Hi", "World").await.unwrap();
        let before = repo.get(&id).await.unwrap();

        repo.update(&id, PostPatch::default().title("X")).await.unwrap();
        let after = repo.get(&id).await.unwrap();

        assert_eq!(after.title, "X");
        assert_eq!(after.content, "World");
        assert_eq!(after.author_id, before.author_id);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_or_empty_id() {
        let (_, repo) = repo();
        let patch = PostPatch::default().title("X");

        for id in ["", "missing"] {
            let err = repo.update(id, patch.clone()).await.unwrap_err();
            assert!(matches!(err, DomainError::NotFound { entity_type: "Post", .. }));
        }
    }

    #[tokio::test]
    async fn test_update_validates_fields() {
        let (store, repo) = repo();
        let id = repo.create(Some(&alice()), "Hi", "World").await.unwrap();
        let writes = store.writes();

        let err = repo
            .update(&id, PostPatch::default().content(" "))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test]
    async fn test_delete_requires_id() {
        let (store, repo) = repo();
        let err = repo.delete("").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_callbacks() {
        let (_, repo) = repo();
        let (seen, on_change) = recorder::<Vec<Post>>();
        let subscription = repo.subscribe_all(on_change).await;
        assert_eq!(seen.lock().unwrap().len(), 1);

        subscription.cancel();
        repo.create(Some(&alice()), "Hi", "World").await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_degrades_to_empty() {
        let (store, repo) = repo();
        repo.create(Some(&alice()), "Hi", "World").await.unwrap();
        let (seen, on_change) = recorder::<Vec<Post>>();
        let _subscription = repo.subscribe_all(on_change).await;

        store.fail();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].len(), 1);
        assert!(seen[1].is_empty());
    }

    #[tokio::test]
    async fn test_writes_fail_when_backend_down() {
        let (store, repo) = repo();
        store.fail();
        let err = repo.create(Some(&alice()), "Hi", "World").await.unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_subscribe_one() {
        let (_, repo) = repo();
        let id = repo.create(Some(&alice()), "Hi", "World").await.unwrap();

        let (seen, on_change) = recorder::<Option<Post>>();
        let _subscription = repo.subscribe_one(&id, on_change).await;
        repo.delete(&id).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].as_ref().map(|p| p.title.as_str()), Some("Hi"));
        assert_eq!(seen.last().unwrap(), &None);
    }

    #[tokio::test]
    async fn test_subscribe_one_empty_id() {
        let (_, repo) = repo();
        let (seen, on_change) = recorder::<Option<Post>>();
        let _subscription = repo.subscribe_one("", on_change).await;
        assert_eq!(seen.lock().unwrap().as_slice(), [None]);
    }

    #[tokio::test]
    async fn test_subscribe_one_backend_error_yields_none() {
        let (store, repo) = repo();
        let id = repo.create(Some(&alice()), "Hi", "World").await.unwrap();
        let (seen, on_change) = recorder::<Option<Post>>();
        let _subscription = repo.subscribe_one(&id, on_change).await;

        store.fail();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_some());
        assert_eq!(seen[1], None);
    }

    #[tokio::test]
    async fn test_callback_can_drop_its_own_subscription() {
        let (_, repo) = repo();
        let handle: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let (seen, record) = recorder::<usize>();

        let slot = handle.clone();
        let subscription = repo
            .subscribe_all(move |posts| {
                record(posts.len());
                if !posts.is_empty() {
                    drop(slot.lock().unwrap().take());
                }
            })
            .await;
        *handle.lock().unwrap() = Some(subscription);

        repo.create(Some(&alice()), "one", "1").await.unwrap();
        repo.create(Some(&alice()), "two", "2").await.unwrap();

        assert!(handle.lock().unwrap().is_none());
        assert_eq!(seen.lock().unwrap().as_slice(), [0, 1]);
    }

    #[tokio::test]
    async fn test_register_post_delete_scenario() {
        use crate::services::SessionStore;
        use crate::services::fakes::FakeAuthBackend;

        let session = SessionStore::new(Arc::new(FakeAuthBackend::default()));
        session.initialize(None).await;
        let identity = session
            .register("a@x.com", "secret1", Some("Alice"))
            .await
            .unwrap();
        assert_eq!(identity.display_name.as_deref(), Some("Alice"));

        let (_, repo) = repo();
        let (seen, on_change) = recorder::<Vec<Post>>();
        let _subscription = repo.subscribe_all(on_change).await;

        let id = repo
            .create(session.current_identity().as_ref(), "Hi", "World")
            .await
            .unwrap();
        {
            let seen = seen.lock().unwrap();
            let latest = seen.last().unwrap();
            assert_eq!(latest.len(), 1);
            assert_eq!(latest[0].title, "Hi");
            assert_eq!(latest[0].content, "World");
            assert_eq!(latest[0].author_id, identity.id);
        }

        repo.delete(&id).await.unwrap();
        assert!(seen.lock().unwrap().last().unwrap().is_empty());
    }
}
