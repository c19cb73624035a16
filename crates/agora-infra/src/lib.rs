//! # Agora Infrastructure
//!
//! Concrete implementations of the ports defined in `agora-core`.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL document store via SeaORM
//! - `minimal` - In-memory store only

pub mod auth;
pub mod database;

pub use auth::{
    Argon2PasswordService, JwtConfig, JwtTokenService, PasswordConfig, gravatar_url,
};
pub use database::{InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, DatabaseConnections, PostgresPostRepository, PostgresUserRepository,
};
