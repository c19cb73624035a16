//! Domain entities - the core business objects.

mod user;

mod post;

pub use post::{Comment, Like, Post};
pub use user::{User, normalize_email};
