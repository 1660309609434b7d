//! Landing page (`/`).

use blogify_core::domain::Identity;
use blogify_core::routing::Route;
use serde::Serialize;

use super::Navbar;
use crate::config::BackendInfo;

#[derive(Debug, Clone, Serialize)]
pub struct HeroAction {
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hero {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub actions: Vec<HeroAction>,
    pub welcome: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendPanel {
    pub project_id: String,
    pub auth_domain: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LandingPage {
    pub navbar: Navbar,
    pub hero: Hero,
    pub features_title: &'static str,
    pub features: Vec<Feature>,
    pub backend: BackendPanel,
}

const FEATURES: [Feature; 4] = [
    Feature {
        icon: "✨",
        title: "Easy to Use",
        description: "Start writing and sharing your thoughts with just a few clicks.",
    },
    Feature {
        icon: "🌍",
        title: "Share Globally",
        description: "Connect with readers from around the world.",
    },
    Feature {
        icon: "🎨",
        title: "Express Yourself",
        description: "Customize your blog and make it uniquely yours.",
    },
    Feature {
        icon: "🔒",
        title: "Secure & Private",
        description: "Your data is protected with backend security rules.",
    },
];

impl LandingPage {
    pub fn new(identity: Option<&Identity>, backend: &BackendInfo) -> Self {
        let (actions, welcome) = match identity {
            Some(identity) => (
                vec![HeroAction {
                    label: "Go to Blog Feed",
                    href: Route::BlogFeed.path(),
                }],
                Some(format!("👋 Welcome back, {}!", identity.label())),
            ),
            None => (
                vec![
                    HeroAction {
                        label: "Login",
                        href: Route::Login.path(),
                    },
                    HeroAction {
                        label: "Signup",
                        href: Route::Signup.path(),
                    },
                ],
                None,
            ),
        };

        Self {
            navbar: Navbar::new(Some(Route::Home), identity.is_some()),
            hero: Hero {
                title: "Welcome to Blogify ✍️",
                subtitle: "A place to share your stories, thoughts, and creativity.",
                actions,
                welcome,
            },
            features_title: "Why Blogify?",
            features: FEATURES.to_vec(),
            backend: BackendPanel {
                project_id: backend.project_id.clone(),
                auth_domain: backend.auth_domain.clone(),
                user_id: identity.map(|identity| identity.id.clone()),
            },
        }
    }
}
