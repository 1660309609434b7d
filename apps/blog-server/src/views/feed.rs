//! Blog feed (`/blog-feed`).
//!
//! Dialog state comes from the query string: `?expand=<id>` shows a post in
//! full, `?compose=true` opens an empty editor, `?edit=<id>` the editor for
//! one of the viewer's posts and `?confirm_delete=<id>` the delete dialog.

use blogify_core::domain::{Identity, Post};
use blogify_core::routing::Route;
use serde::{Deserialize, Serialize};

use super::Navbar;
use super::editor::{DeleteConfirmation, EditorForm};
use super::format::{format_date, is_truncated, snippet};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    pub expand: Option<String>,
    pub edit: Option<String>,
    #[serde(default)]
    pub compose: bool,
    pub confirm_delete: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub author_name: String,
    pub date: String,
    /// Snippet when collapsed, full content when expanded.
    pub body: String,
    pub expanded: bool,
    /// Whether there is more to show than the snippet.
    pub expandable: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl PostCard {
    pub fn new(post: &Post, viewer: Option<&Identity>, expanded: bool) -> Self {
        let own = viewer.is_some_and(|viewer| post.is_authored_by(viewer));
        let expandable = is_truncated(&post.content);
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            author_name: post.author_name.clone(),
            date: format_date(post.created_at),
            body: if expanded {
                post.content.clone()
            } else {
                snippet(&post.content)
            },
            expanded: expanded && expandable,
            expandable,
            can_edit: own,
            can_delete: own,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmptyFeed {
    pub icon: &'static str,
    pub title: &'static str,
    pub message: &'static str,
    pub action: &'static str,
}

const EMPTY_FEED: EmptyFeed = EmptyFeed {
    icon: "📝",
    title: "No Posts Yet",
    message: "Start creating your first blog post to see it here!",
    action: "Create Your First Post",
};

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub navbar: Navbar,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub greeting: String,
    pub posts: Vec<PostCard>,
    pub empty: Option<EmptyFeed>,
    pub editor: Option<EditorForm>,
    pub delete_confirmation: Option<DeleteConfirmation>,
}

impl FeedPage {
    /// Build the feed from the newest-first post list.
    pub fn new(viewer: Option<&Identity>, posts: &[Post], query: &FeedQuery) -> Self {
        let name = viewer
            .and_then(|viewer| viewer.display_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or("Blogger");

        let cards: Vec<PostCard> = posts
            .iter()
            .map(|post| {
                let expanded = query.expand.as_deref() == Some(post.id.as_str());
                PostCard::new(post, viewer, expanded)
            })
            .collect();

        let editor = match owned_post(posts, viewer, query.edit.as_deref()) {
            Some(post) => Some(EditorForm::edit(post)),
            None if query.compose => Some(EditorForm::create()),
            None => None,
        };

        Self {
            navbar: Navbar::new(Some(Route::BlogFeed), viewer.is_some()),
            title: "📰 Blog Feed",
            subtitle: "Discover stories from our community",
            greeting: format!("Welcome, {name}! 👋"),
            empty: cards.is_empty().then_some(EMPTY_FEED),
            posts: cards,
            editor,
            delete_confirmation: owned_post(posts, viewer, query.confirm_delete.as_deref())
                .map(DeleteConfirmation::new),
        }
    }
}

/// The post `id` if the viewer wrote it; only authors get dialogs for a post.
fn owned_post<'a>(
    posts: &'a [Post],
    viewer: Option<&Identity>,
    id: Option<&str>,
) -> Option<&'a Post> {
    let (viewer, id) = (viewer?, id?);
    posts
        .iter()
        .find(|post| post.id == id)
        .filter(|post| post.is_authored_by(viewer))
}
