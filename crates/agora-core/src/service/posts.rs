//! Post resource manager - the full mutation surface of a post.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::{Comment, Post};
use crate::error::{DomainError, RepoError};
use crate::ports::{BaseRepository, PostRepository};
use crate::validation::validate_post_text;

/// Upper bound on the pause between re-applying a write that lost a race.
const MAX_RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Author-supplied content for a post or a comment.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub text: String,
    pub name: String,
    pub avatar: String,
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, user_id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        validate_post_text(&draft.text).map_err(DomainError::Validation)?;

        let post = Post::new(user_id, draft.text.trim().to_string(), draft.name, draft.avatar);
        let saved = self.repo.insert(post).await?;

        tracing::info!(post_id = %saved.id, user_id = %user_id, "Post created");
        Ok(saved)
    }

    /// Every post, newest first. An empty store is not an error.
    pub async fn list_all(&self) -> Result<Vec<Post>, DomainError> {
        let posts = self.repo.find_all_newest_first().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list posts");
            DomainError::from(e)
        })?;
        Ok(posts)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Post, DomainError> {
        self.load(id).await
    }

    /// Delete a post. Only its owner may do so.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        let post = self.load(id).await?;

        if !post.is_owned_by(user_id) {
            tracing::warn!(post_id = %id, user_id = %user_id, "Rejected delete by non-owner");
            return Err(DomainError::Unauthorized);
        }

        match self.repo.delete(id).await {
            Ok(()) => {
                tracing::info!(post_id = %id, "Post deleted");
                Ok(())
            }
            Err(RepoError::NotFound) => Err(DomainError::not_found("Post", id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn like(&self, user_id: Uuid, id: Uuid) -> Result<Post, DomainError> {
        self.mutate(id, |post| post.like(user_id)).await
    }

    pub async fn unlike(&self, user_id: Uuid, id: Uuid) -> Result<Post, DomainError> {
        self.mutate(id, |post| post.unlike(user_id)).await
    }

    pub async fn add_comment(
        &self,
        user_id: Uuid,
        id: Uuid,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        validate_post_text(&draft.text).map_err(DomainError::Validation)?;

        let comment = Comment::new(
            user_id,
            draft.text.trim().to_string(),
            draft.name,
            draft.avatar,
        );
        self.mutate(id, |post| {
            post.add_comment(comment.clone());
            Ok(())
        })
        .await
    }

    /// Remove a comment. Only the comment's author may do so.
    pub async fn remove_comment(
        &self,
        user_id: Uuid,
        id: Uuid,
        comment_id: Uuid,
    ) -> Result<Post, DomainError> {
        self.mutate(id, |post| post.remove_comment(comment_id, user_id).map(|_| ()))
            .await
    }

    async fn load(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    /// Load, apply `change`, and write back conditioned on the loaded version.
    ///
    /// A lost race reloads and re-applies `change` against the fresh state,
    /// so the like/comment rules are always checked against what gets stored.
    /// Every lost race means another writer committed, so the loop ends once
    /// the write lands or the fresh state rejects `change`.
    async fn mutate<F>(&self, id: Uuid, mut change: F) -> Result<Post, DomainError>
    where
        F: FnMut(&mut Post) -> Result<(), DomainError>,
    {
        let mut attempt: u32 = 0;
        loop {
            let mut post = self.load(id).await?;
            let expected_version = post.version;
            change(&mut post)?;

            match self.repo.update(post, expected_version).await {
                Ok(saved) => return Ok(saved),
                Err(RepoError::Conflict) => {
                    attempt = attempt.saturating_add(1);
                    tracing::debug!(post_id = %id, attempt, "Version conflict, retrying");
                    tokio::time::sleep(retry_backoff(attempt)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Nothing before the first retry, then doubling from 1ms up to the cap.
fn retry_backoff(attempt: u32) -> Duration {
    if attempt <= 1 {
        return Duration::ZERO;
    }
    Duration::from_millis(1u64 << (attempt - 2).min(8)).min(MAX_RETRY_BACKOFF)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Map-backed repository that can be told to report a number of stale
    /// writes before accepting one.
    #[derive(Default)]
    struct FlakyRepo {
        posts: Mutex<HashMap<Uuid, Post>>,
        conflicts_left: Mutex<usize>,
        update_calls: Mutex<usize>,
        authors_missing: bool,
    }

    impl FlakyRepo {
        fn with_conflicts(n: usize) -> Self {
            let repo = Self::default();
            *repo.conflicts_left.lock().unwrap() = n;
            repo
        }
    }

    #[async_trait]
    impl BaseRepository<Post, Uuid> for FlakyRepo {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            Ok(self.posts.lock().unwrap().get(&id).cloned())
        }

        async fn insert(&self, post: Post) -> Result<Post, RepoError> {
            if self.authors_missing {
                return Err(RepoError::MissingReference("fk_posts_user_id".to_string()));
            }
            self.posts.lock().unwrap().insert(post.id, post.clone());
            Ok(post)
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.posts
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl PostRepository for FlakyRepo {
        async fn find_all_newest_first(&self) -> Result<Vec<Post>, RepoError> {
            let mut posts: Vec<Post> = self.posts.lock().unwrap().values().cloned().collect();
            posts.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(posts)
        }

        async fn update(&self, mut post: Post, expected_version: i64) -> Result<Post, RepoError> {
            *self.update_calls.lock().unwrap() += 1;

            let mut conflicts = self.conflicts_left.lock().unwrap();
            if *conflicts > 0 {
                *conflicts -= 1;
                return Err(RepoError::Conflict);
            }

            let mut posts = self.posts.lock().unwrap();
            match posts.get(&post.id) {
                Some(stored) if stored.version == expected_version => {
                    post.version = expected_version + 1;
                    posts.insert(post.id, post.clone());
                    Ok(post)
                }
                _ => Err(RepoError::Conflict),
            }
        }
    }

    fn draft(text: &str) -> PostDraft {
        PostDraft {
            text: text.to_string(),
            name: "Jane".to_string(),
            avatar: "jane.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_stale_write_is_retried() {
        let repo = Arc::new(FlakyRepo::with_conflicts(1));
        let service = PostService::new(repo.clone());
        let post = service.create(Uuid::new_v4(), draft("hello")).await.unwrap();

        let liker = Uuid::new_v4();
        let liked = service.like(liker, post.id).await.unwrap();

        assert!(liked.is_liked_by(liker));
        assert_eq!(liked.version, 1);
        assert_eq!(*repo.update_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_long_run_of_stale_writes_still_lands() {
        let repo = Arc::new(FlakyRepo::with_conflicts(12));
        let service = PostService::new(repo.clone());
        let post = service.create(Uuid::new_v4(), draft("hello")).await.unwrap();

        let liker = Uuid::new_v4();
        let liked = service.like(liker, post.id).await.unwrap();

        assert!(liked.is_liked_by(liker));
        assert_eq!(*repo.update_calls.lock().unwrap(), 13);
    }

    #[tokio::test]
    async fn test_domain_error_is_not_retried() {
        let repo = Arc::new(FlakyRepo::default());
        let service = PostService::new(repo.clone());
        let post = service.create(Uuid::new_v4(), draft("hello")).await.unwrap();
        let liker = Uuid::new_v4();
        service.like(liker, post.id).await.unwrap();

        *repo.conflicts_left.lock().unwrap() = 1;
        let err = service.like(liker, post.id).await.unwrap_err();

        assert!(matches!(err, DomainError::AlreadyLiked));
        assert_eq!(*repo.update_calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_retry_backoff_is_capped() {
        assert_eq!(retry_backoff(1), Duration::ZERO);
        assert_eq!(retry_backoff(2), Duration::from_millis(1));
        assert_eq!(retry_backoff(4), Duration::from_millis(4));
        assert_eq!(retry_backoff(40), MAX_RETRY_BACKOFF);
    }

    #[tokio::test]
    async fn test_retried_comment_is_added_once() {
        let repo = Arc::new(FlakyRepo::with_conflicts(2));
        let service = PostService::new(repo);
        let post = service.create(Uuid::new_v4(), draft("hello")).await.unwrap();

        let updated = service
            .add_comment(Uuid::new_v4(), post.id, draft("first!"))
            .await
            .unwrap();

        assert_eq!(updated.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_create_trims_and_validates() {
        let service = PostService::new(Arc::new(FlakyRepo::default()));

        let post = service.create(Uuid::new_v4(), draft("  hi  ")).await.unwrap();
        assert_eq!(post.text, "hi");

        let err = service.create(Uuid::new_v4(), draft("")).await.unwrap_err();
        match err {
            DomainError::Validation(errors) => assert!(errors.get("text").is_some()),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_for_deleted_author_is_unauthorized() {
        let service = PostService::new(Arc::new(FlakyRepo {
            authors_missing: true,
            ..FlakyRepo::default()
        }));

        let err = service.create(Uuid::new_v4(), draft("hello")).await.unwrap_err();

        assert!(matches!(err, DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let service = PostService::new(Arc::new(FlakyRepo::default()));
        let err = service.like(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity_type: "Post", .. }));
    }
}
