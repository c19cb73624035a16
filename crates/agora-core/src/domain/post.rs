use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// A single like. At most one per user on any given post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    #[serde(rename = "user")]
    pub user_id: Uuid,
}

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: Uuid, text: String, name: String, avatar: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            text,
            name,
            avatar,
            date: Utc::now(),
        }
    }
}

/// Post entity - a status update with its likes and comments.
///
/// `likes` and `comments` are kept newest-first. They must only be changed
/// through [`Post::like`], [`Post::unlike`], [`Post::add_comment`] and
/// [`Post::remove_comment`], which uphold the per-post uniqueness rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
    pub date: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped by the store on every update.
    #[serde(skip)]
    pub version: i64,
}

impl Post {
    /// Create a new post.
    pub fn new(user_id: Uuid, text: String, name: String, avatar: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            text,
            name,
            avatar,
            likes: Vec::new(),
            comments: Vec::new(),
            date: Utc::now(),
            version: 0,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.iter().any(|like| like.user_id == user_id)
    }

    pub fn like(&mut self, user_id: Uuid) -> Result<(), DomainError> {
        if self.is_liked_by(user_id) {
            return Err(DomainError::AlreadyLiked);
        }
        self.likes.insert(0, Like { user_id });
        Ok(())
    }

    pub fn unlike(&mut self, user_id: Uuid) -> Result<(), DomainError> {
        let index = self
            .likes
            .iter()
            .position(|like| like.user_id == user_id)
            .ok_or(DomainError::NotLiked)?;
        self.likes.remove(index);
        Ok(())
    }

    /// Prepend a comment. Re-adding a comment whose id is already present is
    /// a no-op, which keeps retried writes from duplicating it.
    pub fn add_comment(&mut self, comment: Comment) {
        if self.comments.iter().any(|c| c.id == comment.id) {
            return;
        }
        self.comments.insert(0, comment);
    }

    /// Remove a comment written by `user_id`.
    ///
    /// Fails with [`DomainError::CommentNotFound`] when no comment carries
    /// `comment_id`, and with [`DomainError::Unauthorized`] when the comment
    /// belongs to someone else.
    pub fn remove_comment(
        &mut self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Comment, DomainError> {
        let index = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or(DomainError::CommentNotFound)?;

        if self.comments[index].user_id != user_id {
            return Err(DomainError::Unauthorized);
        }

        Ok(self.comments.remove(index))
    }
}
