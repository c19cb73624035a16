//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_core::{DomainError, PostDraft};
use agora_shared::dto::{DeleteResponse, PostRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| DomainError::not_found("Post", raw).into())
}

fn parse_comment_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| DomainError::CommentNotFound.into())
}

/// Body fields win; the caller's own display fields fill the gaps.
fn draft_for(identity: &Identity, req: PostRequest) -> PostDraft {
    let pick = |value: Option<String>, fallback: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };

    PostDraft {
        name: pick(req.name, &identity.name),
        avatar: pick(req.avatar, &identity.avatar),
        text: req.text,
    }
}

/// GET /api/posts
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list_all().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let post = state.posts.get_by_id(id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts
pub async fn create_post(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let draft = draft_for(&identity, body.into_inner());
    let post = state.posts.create(identity.user_id, draft).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    state.posts.delete(identity.user_id, id).await?;
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true }))
}

/// POST /api/posts/like/{id}
pub async fn like_post(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let post = state.posts.like(identity.user_id, id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts/unlike/{id}
pub async fn unlike_post(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let post = state.posts.unlike(identity.user_id, id).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts/comment/{id}
pub async fn add_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let draft = draft_for(&identity, body.into_inner());
    let post = state.posts.add_comment(identity.user_id, id, draft).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/comment/{id}/{comment_id}
pub async fn remove_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (raw_id, raw_comment_id) = path.into_inner();
    let id = parse_post_id(&raw_id)?;
    let comment_id = parse_comment_id(&raw_comment_id)?;

    let post = state
        .posts
        .remove_comment(identity.user_id, id, comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}
