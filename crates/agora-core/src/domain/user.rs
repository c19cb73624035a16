use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - an account that can author posts, likes and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamp.
    ///
    /// The email is stored lowercased so lookups are case-insensitive.
    pub fn new(name: String, email: &str, avatar: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: normalize_email(email),
            avatar,
            password_hash,
            date: Utc::now(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
