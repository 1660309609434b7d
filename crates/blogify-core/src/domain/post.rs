use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Identity;
use crate::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const CONTENT_MAX_CHARS: usize = 5000;

/// Author name recorded when the author has no display name.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Post entity - a blog entry from the `posts` collection.
///
/// The id is the document key; it is not part of the stored document.
/// Timestamps are stored as epoch milliseconds and may be missing on
/// documents written by other clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Whether `identity` wrote this post and may edit or delete it.
    pub fn is_authored_by(&self, identity: &Identity) -> bool {
        !self.author_id.is_empty() && self.author_id == identity.id
    }

    /// Ordering key for the feed; posts without `createdAt` count as 0.
    pub fn created_at_millis(&self) -> i64 {
        self.created_at.map_or(0, |t| t.timestamp_millis())
    }
}

/// Document written when a post is created.
///
/// The author fields are a snapshot taken at creation time and are not
/// updated when the author later changes their profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    pub author_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl NewPost {
    /// Build a validated document for `author`; title and content are trimmed.
    pub fn new(
        author: &Identity,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            title: validate_title(title)?.to_string(),
            content: validate_content(content)?.to_string(),
            author_id: author.id.clone(),
            author_email: author.email.clone(),
            author_name: author
                .display_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .unwrap_or(ANONYMOUS_AUTHOR)
                .to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update of a post's editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Trim and validate the fields that are present.
    pub fn validated(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: self
                .title
                .as_deref()
                .map(validate_title)
                .transpose()?
                .map(str::to_string),
            content: self
                .content
                .as_deref()
                .map(validate_content)
                .transpose()?
                .map(str::to_string),
        })
    }

    /// Fields to merge into the stored document, `updatedAt` included.
    pub fn into_fields(self, updated_at: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(title) = self.title {
            fields.insert("title".to_string(), Value::String(title));
        }
        if let Some(content) = self.content {
            fields.insert("content".to_string(), Value::String(content));
        }
        fields.insert(
            "updatedAt".to_string(),
            Value::from(updated_at.timestamp_millis()),
        );
        fields
    }
}

/// Trimmed title, or a validation error if empty or too long.
pub fn validate_title(title: &str) -> Result<&str, DomainError> {
    validate_field("title", title, TITLE_MAX_CHARS)
}

/// Trimmed content, or a validation error if empty or too long.
pub fn validate_content(content: &str) -> Result<&str, DomainError> {
    validate_field("content", content, CONTENT_MAX_CHARS)
}

fn validate_field<'a>(name: &str, value: &'a str, max_chars: usize) -> Result<&'a str, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{name} must not be empty")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(DomainError::Validation(format!(
            "{name} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed)
}

/// Sort newest first by `createdAt`. The sort is stable, so posts with equal
/// keys keep their collection order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|post| Reverse(post.created_at_millis()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(id: &str, created_at: Option<i64>) -> Post {
        Post {
            id: id.to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            author_id: "u1".to_string(),
            author_email: "a@x.com".to_string(),
            author_name: "Alice".to_string(),
            created_at: created_at.and_then(DateTime::from_timestamp_millis),
            updated_at: None,
        }
    }

    #[test]
    fn test_validate_trims() {
        assert_eq!(validate_title("  Hi  ").unwrap(), "Hi");
        assert_eq!(validate_content("\nWorld\t").unwrap(), "World");
    }

    #[test]
    fn test_validate_rejects_blank_and_long() {
        assert!(matches!(validate_title("   "), Err(DomainError::Validation(_))));
        assert!(matches!(validate_content(""), Err(DomainError::Validation(_))));

        let long_title = "x".repeat(TITLE_MAX_CHARS + 1);
        assert!(matches!(validate_title(&long_title), Err(DomainError::Validation(_))));
        assert!(validate_title(&"x".repeat(TITLE_MAX_CHARS)).is_ok());

        let long_content = "é".repeat(CONTENT_MAX_CHARS + 1);
        assert!(matches!(validate_content(&long_content), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_new_post_snapshots_author() {
        let author = Identity::new("u1", "a@x.com").with_display_name("Alice");
        let now = Utc::now();
        let doc = NewPost::new(&author, " Hi ", " World ", now).unwrap();

        assert_eq!(doc.title, "Hi");
        assert_eq!(doc.content, "World");
        assert_eq!(doc.author_id, "u1");
        assert_eq!(doc.author_name, "Alice");
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[test]
    fn test_new_post_anonymous_author() {
        let author = Identity::new("u1", "a@x.com");
        let doc = NewPost::new(&author, "Hi", "World", Utc::now()).unwrap();
        assert_eq!(doc.author_name, ANONYMOUS_AUTHOR);
    }

    #[test]
    fn test_document_shape() {
        let author = Identity::new("u1", "a@x.com");
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let doc = NewPost::new(&author, "Hi", "World", now).unwrap();

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["authorId"], json!("u1"));
        assert_eq!(value["createdAt"], json!(1_700_000_000_000_i64));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_decode_document_without_timestamps() {
        let value = json!({ "title": "Hi", "content": "World", "authorId": "u1" });
        let post: Post = serde_json::from_value(value).unwrap();
        assert_eq!(post.created_at, None);
        assert_eq!(post.created_at_millis(), 0);
    }

    #[test]
    fn test_patch_fields() {
        let now = DateTime::from_timestamp_millis(42).unwrap();
        let fields = PostPatch::default()
            .title(" X ")
            .validated()
            .unwrap()
            .into_fields(now);

        assert_eq!(fields.get("title"), Some(&json!("X")));
        assert!(fields.get("content").is_none());
        assert_eq!(fields.get("updatedAt"), Some(&json!(42)));
    }

    #[test]
    fn test_patch_rejects_blank_title() {
        let result = PostPatch::default().title("  ").validated();
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let mut posts = vec![
            post("old", Some(1)),
            post("none-a", None),
            post("new", Some(3)),
            post("mid-a", Some(2)),
            post("none-b", None),
            post("mid-b", Some(2)),
        ];
        sort_newest_first(&mut posts);

        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["new", "mid-a", "mid-b", "old", "none-a", "none-b"]);
    }

    #[test]
    fn test_ownership() {
        let alice = Identity::new("u1", "a@x.com");
        let bob = Identity::new("u2", "b@x.com");
        let p = post("p1", Some(1));
        assert!(p.is_authored_by(&alice));
        assert!(!p.is_authored_by(&bob));
    }
}
