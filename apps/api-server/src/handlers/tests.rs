use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};
use uuid::Uuid;

use agora_core::domain::User;
use agora_core::ports::{PasswordService, TokenService};
use agora_infra::{Argon2PasswordService, JwtConfig, JwtTokenService, PasswordConfig};

use crate::state::AppState;

struct Ctx {
    state: AppState,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
}

impl Ctx {
    fn new() -> Self {
        Self {
            state: AppState::in_memory(),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "handler-test-secret".to_string(),
                ..JwtConfig::default()
            })),
            passwords: Arc::new(
                Argon2PasswordService::with_config(PasswordConfig {
                    memory_kib: 1024,
                    iterations: 1,
                    parallelism: 1,
                })
                .unwrap(),
            ),
        }
    }

    /// Bearer header value for a fresh, unregistered user.
    fn bearer(&self, name: &str) -> (Uuid, String) {
        let user = User::new(
            name.to_string(),
            &format!("{}@example.com", name.to_lowercase()),
            format!("https://avatars.test/{name}"),
            String::new(),
        );
        let token = self.tokens.generate_token(&user).unwrap();
        (user.id, format!("Bearer {token}"))
    }
}

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx.state.clone()))
                .app_data(web::Data::new($ctx.tokens.clone()))
                .app_data(web::Data::new($ctx.passwords.clone()))
                .configure(super::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_create_requires_token() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({ "text": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Authentication Required");
}

#[actix_web::test]
async fn test_garbage_token_is_rejected() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/posts/like/00000000-0000-0000-0000-000000000000")
        .insert_header((header::AUTHORIZATION, "Bearer not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_and_fetch_post() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);
    let (user_id, bearer) = ctx.bearer("Jane");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, bearer))
        .set_json(json!({ "text": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = test::read_body_json(resp).await;

    assert_eq!(created["text"], "hello");
    assert_eq!(created["user"], user_id.to_string());
    assert_eq!(created["name"], "Jane");
    assert_eq!(created["avatar"], "https://avatars.test/Jane");
    assert!(created.get("version").is_none());

    let id = created["id"].as_str().unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(fetched["id"], id);
    assert_eq!(fetched["likes"], json!([]));
    assert_eq!(fetched["comments"], json!([]));
}

#[actix_web::test]
async fn test_create_uses_body_display_fields() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);
    let (_, bearer) = ctx.bearer("Jane");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, bearer))
        .set_json(json!({ "text": "hi", "name": "J.", "avatar": "custom.png" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(created["name"], "J.");
    assert_eq!(created["avatar"], "custom.png");
}

#[actix_web::test]
async fn test_create_with_blank_text_is_validation_error() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);
    let (_, bearer) = ctx.bearer("Jane");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, bearer))
        .set_json(json!({ "name": "Jane" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["text"], "Text field is required");
}

#[actix_web::test]
async fn test_malformed_json_is_problem_document() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);
    let (_, bearer) = ctx.bearer("Jane");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, bearer))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Bad Request");
}

#[actix_web::test]
async fn test_unknown_or_malformed_post_id_is_not_found() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);

    for id in ["not-a-uuid".to_string(), Uuid::new_v4().to_string()] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[actix_web::test]
async fn test_like_unlike_cycle() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);
    let (_, owner) = ctx.bearer("Owner");
    let (liker_id, liker) = ctx.bearer("Liker");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, owner))
        .set_json(json!({ "text": "hello" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();

    let like = || {
        test::TestRequest::post()
            .uri(&format!("/api/posts/like/{id}"))
            .insert_header((header::AUTHORIZATION, liker.clone()))
            .to_request()
    };

    let liked: Value = test::call_and_read_body_json(&app, like()).await;
    assert_eq!(liked["likes"], json!([{ "user": liker_id.to_string() }]));

    let resp = test::call_service(&app, like()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "User already liked this post");

    let unlike = || {
        test::TestRequest::post()
            .uri(&format!("/api/posts/unlike/{id}"))
            .insert_header((header::AUTHORIZATION, liker.clone()))
            .to_request()
    };

    let unliked: Value = test::call_and_read_body_json(&app, unlike()).await;
    assert_eq!(unliked["likes"], json!([]));

    let resp = test::call_service(&app, unlike()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_like_missing_post_is_not_found() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);
    let (_, bearer) = ctx.bearer("Jane");

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/like/{}", Uuid::new_v4()))
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_delete_is_owner_only() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);
    let (_, owner) = ctx.bearer("Owner");
    let (_, stranger) = ctx.bearer("Stranger");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, owner.clone()))
        .set_json(json!({ "text": "mine" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/posts/{}", created["id"].as_str().unwrap());

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, stranger))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, owner.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "success": true }));

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_comment_add_and_remove() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);
    let (_, owner) = ctx.bearer("Owner");
    let (commenter_id, commenter) = ctx.bearer("Commenter");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header((header::AUTHORIZATION, owner.clone()))
        .set_json(json!({ "text": "hello" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/comment/{id}"))
        .insert_header((header::AUTHORIZATION, commenter.clone()))
        .set_json(json!({ "text": "nice post" }))
        .to_request();
    let commented: Value = test::call_and_read_body_json(&app, req).await;
    let comment = &commented["comments"][0];
    assert_eq!(comment["text"], "nice post");
    assert_eq!(comment["user"], commenter_id.to_string());
    assert_eq!(comment["name"], "Commenter");
    let comment_id = comment["id"].as_str().unwrap().to_string();

    // The post owner is not the comment author.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/comment/{id}/{comment_id}"))
        .insert_header((header::AUTHORIZATION, owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/comment/{id}/{comment_id}"))
        .insert_header((header::AUTHORIZATION, commenter.clone()))
        .to_request();
    let after: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(after["comments"], json!([]));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/comment/{id}/{comment_id}"))
        .insert_header((header::AUTHORIZATION, commenter))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Comment does not exist");
}

#[actix_web::test]
async fn test_list_posts_newest_first() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);
    let (_, bearer) = ctx.bearer("Jane");

    let empty: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/posts").to_request())
            .await;
    assert_eq!(empty, json!([]));

    for text in ["first", "second", "third"] {
        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .set_json(json!({ "text": text }))
            .to_request();
        test::call_service(&app, req).await;
    }

    let listed: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/posts").to_request())
            .await;
    let dates: Vec<chrono::DateTime<chrono::Utc>> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["date"].as_str().unwrap().parse().unwrap())
        .collect();

    assert_eq!(dates.len(), 3);
    assert!(dates.windows(2).all(|w| w[0] >= w[1]));
}

#[actix_web::test]
async fn test_register_login_current() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);

    let register = || {
        test::TestRequest::post()
            .uri("/api/users/register")
            .set_json(json!({
                "name": "Jane Doe",
                "email": "Jane@Example.com",
                "password": "secret1",
                "password2": "secret1"
            }))
            .to_request()
    };

    let resp = test::call_service(&app, register()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: Value = test::read_body_json(resp).await;
    assert_eq!(user["email"], "jane@example.com");
    assert!(user["avatar"].as_str().unwrap().starts_with("https://www.gravatar.com/avatar/"));
    assert!(user.get("password_hash").is_none());

    let resp = test::call_service(&app, register()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "email": "jane@example.com", "password": "wrong-pw" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "email": "jane@example.com", "password": "secret1" }))
        .to_request();
    let auth: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(auth["token_type"], "Bearer");
    let token = auth["access_token"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/users/current")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let current: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(current["id"], user["id"]);
    assert_eq!(current["name"], "Jane Doe");
    assert_eq!(current["avatar"], user["avatar"]);
}

#[actix_web::test]
async fn test_register_reports_field_errors() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({ "name": "J", "email": "nope", "password": "secret1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["name"].is_string());
    assert_eq!(body["errors"]["email"], "Email is invalid");
    assert_eq!(body["errors"]["password2"], "Confirm password field is required");
}

#[actix_web::test]
async fn test_health() {
    let ctx = Ctx::new();
    let app = init_app!(ctx);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/health").to_request())
            .await;
    assert_eq!(body["status"], "ok");
}
