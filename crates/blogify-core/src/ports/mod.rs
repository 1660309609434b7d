//! Ports - trait definitions for the hosted backend and other external services.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod rate_limit;
mod store;
mod subscription;

pub use auth::{AuthBackend, AuthError, AuthSession, PasswordService, TokenClaims, TokenService};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use store::{
    CollectionSnapshot, Document, DocumentSnapshot, DocumentStore, SnapshotHandler, record_path,
    split_record_path,
};
pub use subscription::{DeliveryGate, Subscription};
