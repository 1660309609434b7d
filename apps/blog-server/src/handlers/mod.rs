//! HTTP handlers and route configuration.

mod auth;
mod health;
mod pages;
mod posts;

use actix_web::web;

#[cfg(feature = "rate-limit")]
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    let auth_routes = web::scope("/auth")
        .route("/register", web::post().to(auth::register))
        .route("/login", web::post().to(auth::login))
        .route("/logout", web::post().to(auth::logout))
        .route("/reset-password", web::post().to(auth::reset_password))
        .route("/me", web::get().to(auth::me));

    #[cfg(feature = "rate-limit")]
    let auth_routes = auth_routes.wrap(RateLimitMiddleware::new(state.rate_limiter.clone()));
    #[cfg(not(feature = "rate-limit"))]
    let _ = state;

    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(auth_routes)
            // Post routes; the stream is registered before `{id}`
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/stream", web::get().to(posts::stream_posts))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post)),
            ),
    )
    // Pages
    .route("/", web::get().to(pages::landing))
    .route("/about", web::get().to(pages::about))
    .route("/blog-feed", web::get().to(pages::blog_feed))
    .route("/dashboard", web::get().to(pages::dashboard))
    .route("/login", web::get().to(pages::login))
    .route("/signup", web::get().to(pages::signup))
    .route("/forgot-password", web::get().to(pages::forgot_password));
}
