//! Post editor and delete confirmation dialogs.

use blogify_core::domain::{CONTENT_MAX_CHARS, Identity, Post, TITLE_MAX_CHARS};
use serde::Serialize;

use super::format::char_count;

pub const MISSING_FIELDS: &str = "Please fill in all fields";
pub const NOT_LOGGED_IN: &str = "You must be logged in to post";
pub const SAVE_FAILED: &str = "Failed to save post. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EditorMode {
    Create,
    Edit { post_id: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct EditorForm {
    #[serde(flatten)]
    pub mode: EditorMode,
    pub heading: &'static str,
    pub subheading: &'static str,
    pub title: String,
    pub content: String,
    pub title_count: String,
    pub content_count: String,
    pub submit_label: &'static str,
}

impl EditorForm {
    /// Empty form for a new post.
    pub fn create() -> Self {
        Self::build(EditorMode::Create, String::new(), String::new())
    }

    /// Form prefilled with an existing post.
    pub fn edit(post: &Post) -> Self {
        Self::build(
            EditorMode::Edit {
                post_id: post.id.clone(),
            },
            post.title.clone(),
            post.content.clone(),
        )
    }

    fn build(mode: EditorMode, title: String, content: String) -> Self {
        let (heading, submit_label) = match mode {
            EditorMode::Create => ("✍️ Create New Post", "Publish Post"),
            EditorMode::Edit { .. } => ("✏️ Edit Post", "Update Post"),
        };
        Self {
            heading,
            subheading: "Share your thoughts with the community",
            title_count: char_count(&title, TITLE_MAX_CHARS),
            content_count: char_count(&content, CONTENT_MAX_CHARS),
            title,
            content,
            submit_label,
            mode,
        }
    }
}

/// Check a submission before anything is sent to the backend.
pub fn validate_submission(
    title: &str,
    content: &str,
    author: Option<&Identity>,
) -> Result<(), &'static str> {
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(MISSING_FIELDS);
    }
    if author.is_none() {
        return Err(NOT_LOGGED_IN);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteConfirmation {
    pub post_id: String,
    pub heading: &'static str,
    pub prompt: &'static str,
    pub post_title: String,
    pub warning: &'static str,
    pub cancel_label: &'static str,
    pub confirm_label: &'static str,
}

impl DeleteConfirmation {
    pub fn new(post: &Post) -> Self {
        Self {
            post_id: post.id.clone(),
            heading: "⚠️ Confirm Delete",
            prompt: "Are you sure you want to delete this post?",
            post_title: post.title.clone(),
            warning: "This action cannot be undone.",
            cancel_label: "Cancel",
            confirm_label: "Delete Post",
        }
    }
}
