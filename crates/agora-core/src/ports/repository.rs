use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All posts, newest `date` first.
    async fn find_all_newest_first(&self) -> Result<Vec<Post>, RepoError>;

    /// Replace a stored post if its version still equals `expected_version`.
    ///
    /// On success the returned post carries `expected_version + 1`. A missing
    /// post or a version mismatch both yield [`RepoError::Conflict`]; callers
    /// reload to tell them apart.
    async fn update(&self, post: Post, expected_version: i64) -> Result<Post, RepoError>;
}
