//! User registration and login handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use agora_core::domain::User;
use agora_core::ports::{AuthError, BaseRepository, PasswordService, TokenService};
use agora_core::validation::{validate_login, validate_registration};
use agora_infra::gravatar_url;
use agora_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/users/register
pub async fn register(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    validate_registration(&req.name, &req.email, &req.password, &req.password2)
        .map_err(AppError::Validation)?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password_service.hash(&req.password)?;

    let user = User::new(
        req.name.trim().to_string(),
        &req.email,
        gravatar_url(&req.email),
        password_hash,
    );
    let saved_user = state.users.insert(user).await?;

    tracing::info!(user_id = %saved_user.id, "User registered");

    Ok(HttpResponse::Created().json(UserResponse {
        id: saved_user.id.to_string(),
        name: saved_user.name,
        email: saved_user.email,
        avatar: saved_user.avatar,
    }))
}

/// POST /api/users/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    validate_login(&req.email, &req.password).map_err(AppError::Validation)?;

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let valid = password_service.verify(&req.password, &user.password_hash)?;

    if !valid {
        tracing::debug!(user_id = %user.id, "Rejected login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = token_service
        .generate_token(&user)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds().max(0) as u64,
    }))
}

/// GET /api/users/current - Protected route
pub async fn current(identity: Identity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse {
        id: identity.user_id.to_string(),
        name: identity.name,
        email: identity.email,
        avatar: identity.avatar,
    }))
}
