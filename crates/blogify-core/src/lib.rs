//! # Blogify Core
//!
//! The domain layer of Blogify.
//! Identities and posts, the session store, the post repository and the
//! route guard. The hosted backend is reached only through the traits in
//! [`ports`], so this crate carries no infrastructure dependencies.

pub mod clock;
pub mod domain;
pub mod error;
pub mod ports;
pub mod routing;
pub mod services;

pub use error::{DomainError, StoreError};
pub use services::{PostRepository, SessionState, SessionStore};
