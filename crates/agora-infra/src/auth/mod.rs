//! Authentication implementations.

mod avatar;
mod jwt;
mod password;

pub use avatar::gravatar_url;
pub use jwt::{JwtConfig, JwtTokenService};
pub use password::{Argon2PasswordService, PasswordConfig};
