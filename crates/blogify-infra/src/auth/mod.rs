//! Authentication implementations.

mod jwt;
mod memory;
mod password;

pub use jwt::{JwtConfig, JwtTokenService};
pub use memory::InMemoryAuthBackend;
pub use password::{Argon2PasswordService, MIN_PASSWORD_LEN};
