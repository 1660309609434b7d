//! Dashboard (`/dashboard`).

use blogify_core::domain::{Identity, Post};
use blogify_core::routing::Route;
use serde::Serialize;

use super::Navbar;
use super::format::format_date;

#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub name: String,
    pub email: String,
    pub user_id: String,
    pub account_created: String,
    pub last_sign_in: String,
    pub email_verified: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub label: &'static str,
    pub value: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickAction {
    pub icon: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardPage {
    pub navbar: Navbar,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub account: AccountInfo,
    pub stats: Vec<Stat>,
    pub quick_actions: Vec<QuickAction>,
}

impl DashboardPage {
    /// `posts` is the full feed; only the identity's own posts are counted.
    pub fn new(identity: &Identity, posts: &[Post]) -> Self {
        let own_posts = posts
            .iter()
            .filter(|post| post.is_authored_by(identity))
            .count();

        Self {
            navbar: Navbar::new(Some(Route::Dashboard), true),
            title: "📊 Dashboard",
            subtitle: "Manage your account and content",
            account: AccountInfo {
                name: identity
                    .display_name
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| "Not set".to_string()),
                email: identity.email.clone(),
                user_id: identity.id.clone(),
                account_created: format_date(Some(identity.created_at)),
                last_sign_in: format_date(identity.last_sign_in_at),
                email_verified: if identity.email_verified {
                    "✅ Yes"
                } else {
                    "❌ No"
                },
            },
            stats: vec![
                Stat {
                    label: "Posts",
                    value: own_posts,
                },
                Stat {
                    label: "Followers",
                    value: 0,
                },
                Stat {
                    label: "Following",
                    value: 0,
                },
                Stat {
                    label: "Likes",
                    value: 0,
                },
            ],
            quick_actions: vec![
                QuickAction {
                    icon: "✍️",
                    label: "Write New Post",
                },
                QuickAction {
                    icon: "⚙️",
                    label: "Edit Profile",
                },
                QuickAction {
                    icon: "🔔",
                    label: "Notifications",
                },
                QuickAction {
                    icon: "📊",
                    label: "Analytics",
                },
            ],
        }
    }
}
