//! HTTP handlers and route configuration.

mod health;
mod posts;
mod users;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, error::JsonPayloadError, web};

use crate::middleware::error::AppError;

/// Malformed JSON bodies get the same problem document as every other error.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(
            web::scope("/api")
                // Public routes
                .route("/health", web::get().to(health::health_check))
                .service(
                    web::scope("/users")
                        .route("/register", web::post().to(users::register))
                        .route("/login", web::post().to(users::login))
                        .route("/current", web::get().to(users::current)),
                )
                .service(
                    web::scope("/posts")
                        .route("", web::get().to(posts::list_posts))
                        .route("", web::post().to(posts::create_post))
                        .route("/like/{id}", web::post().to(posts::like_post))
                        .route("/unlike/{id}", web::post().to(posts::unlike_post))
                        .route("/comment/{id}", web::post().to(posts::add_comment))
                        .route(
                            "/comment/{id}/{comment_id}",
                            web::delete().to(posts::remove_comment),
                        )
                        .route("/{id}", web::get().to(posts::get_post))
                        .route("/{id}", web::delete().to(posts::delete_post)),
                ),
        );
}
