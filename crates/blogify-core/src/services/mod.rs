//! Application services wrapping the hosted backend.

mod posts;
mod session;

#[cfg(test)]
pub(crate) mod fakes;

pub use posts::{POSTS_COLLECTION, PostRepository};
pub use session::{SessionState, SessionStore};
