//! # Blogify Infrastructure
//!
//! Concrete implementations of the ports defined in `blogify-core`: the hosted
//! auth service, the realtime document store, and request throttling.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - Document store only
//! - `auth` - In-memory auth backend with JWT sessions and Argon2 hashing
//! - `rate-limit` - Rate limiting via governor

pub mod store;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use store::InMemoryDocumentStore;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, InMemoryAuthBackend, JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
