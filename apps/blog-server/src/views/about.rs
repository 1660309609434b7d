//! About page (`/about`).

use blogify_core::domain::Identity;
use blogify_core::routing::Route;
use serde::Serialize;

use super::Navbar;

#[derive(Debug, Clone, Serialize)]
pub struct AboutPage {
    pub navbar: Navbar,
    pub title: &'static str,
    pub paragraphs: [&'static str; 2],
    pub logged_in_as: Option<String>,
}

impl AboutPage {
    pub fn new(identity: Option<&Identity>) -> Self {
        Self {
            navbar: Navbar::new(Some(Route::About), identity.is_some()),
            title: "About Blogify",
            paragraphs: [
                "Blogify is a modern blogging platform with realtime updates.",
                "Create, share, and discover amazing content!",
            ],
            logged_in_as: identity.map(|identity| identity.email.clone()),
        }
    }
}
