//! Page view models.
//!
//! Every page is a serializable struct built from the session and post
//! state; the page handlers answer with it as JSON.

pub mod about;
pub mod auth_forms;
pub mod dashboard;
pub mod editor;
pub mod feed;
pub mod format;
pub mod landing;
pub mod nav;

pub use about::AboutPage;
pub use auth_forms::AuthFormPage;
pub use dashboard::DashboardPage;
pub use feed::{FeedPage, FeedQuery};
pub use landing::LandingPage;
pub use nav::Navbar;
