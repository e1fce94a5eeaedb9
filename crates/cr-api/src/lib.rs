//! # cr-api
//!
//! The HTTP routing layer for content-rater.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

pub use error::ApiError;
pub use handlers::AppState;

/// Registers every route plus the JSON error handlers for rejected
/// extractors. The binary wraps it with [`middleware::standard_middleware`]
/// and [`middleware::cors_policy`].
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    use handlers::{analytics, contents, ratings};

    cfg.app_data(middleware::json_config())
        .app_data(middleware::path_config())
        .app_data(middleware::query_config())
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api/contents")
                .route("", web::get().to(contents::list_contents))
                .route("", web::post().to(contents::create_content))
                // literal segments before `/{id}`
                .route("/top-quality", web::get().to(contents::top_quality))
                .route("/genre/{genre}", web::get().to(contents::contents_by_genre))
                .route("/{id}", web::get().to(contents::get_content))
                .route("/{id}", web::put().to(contents::update_content))
                .route("/{id}", web::delete().to(contents::delete_content))
                .route("/{id}/recompute", web::post().to(contents::recompute_content)),
        )
        .service(
            web::scope("/api/ratings")
                .route("", web::get().to(ratings::list_ratings))
                .route("", web::post().to(ratings::create_rating))
                .route("/content/{content_id}", web::get().to(ratings::ratings_by_content))
                .route("/user/{user_id}", web::get().to(ratings::ratings_by_user))
                .route("/user/{user_id}/stats", web::get().to(ratings::user_stats))
                .route(
                    "/distribution/{content_id}",
                    web::get().to(ratings::rating_distribution),
                )
                .route("/{id}", web::get().to(ratings::get_rating))
                .route("/{id}", web::put().to(ratings::update_rating))
                .route("/{id}", web::delete().to(ratings::delete_rating)),
        )
        .service(
            web::scope("/api/analytics")
                .route("/dashboard", web::get().to(analytics::dashboard))
                .route("/overview", web::get().to(analytics::overview))
                .route("/distribution", web::get().to(analytics::distribution)),
        );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use cr_core::{PageLimits, Services};
    use cr_store_memory::{MemoryContentRepo, MemoryRatingRepo};
    use serde_json::Value;

    use super::*;

    #[actix_web::test]
    async fn health_and_unknown_routes() {
        let state = web::Data::new(AppState::new(
            Services::new(
                Arc::new(MemoryContentRepo::new()),
                Arc::new(MemoryRatingRepo::new()),
            ),
            PageLimits::default(),
        ));
        let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");

        let req = test::TestRequest::get().uri("/api/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
