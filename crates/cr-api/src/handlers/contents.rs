//! `/api/contents` handlers.

use actix_web::{web, HttpResponse};
use cr_core::{ContentDraft, ContentSort, ContentSortKey, Genre, SortOrder};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{created, ok, page, ApiResult, AppState};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<ContentSortKey>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopQualityParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub min_rating: Option<f64>,
    pub min_reviews: Option<u64>,
}

pub async fn list_contents(
    data: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> ApiResult {
    let params = params.into_inner();
    let sort = ContentSort {
        key: params.sort_by.unwrap_or_default(),
        order: params.sort_order.unwrap_or_default(),
    };
    let req = data.limits.request(params.page, params.limit);
    Ok(page(data.services.catalog.list(sort, req).await?))
}

pub async fn create_content(
    data: web::Data<AppState>,
    payload: web::Json<ContentDraft>,
) -> ApiResult {
    let content = data.services.catalog.create(payload.into_inner()).await?;
    Ok(created(content))
}

pub async fn top_quality(
    data: web::Data<AppState>,
    params: web::Query<TopQualityParams>,
) -> ApiResult {
    let params = params.into_inner();
    let req = data.limits.request(params.page, params.limit);
    let contents = data
        .services
        .catalog
        .top_quality(params.min_rating, params.min_reviews, req)
        .await?;
    Ok(page(contents))
}

pub async fn contents_by_genre(
    data: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<super::PageParams>,
) -> ApiResult {
    let genre: Genre = path.parse().map_err(ApiError::bad_request)?;
    let req = data.limits.request(params.page, params.limit);
    Ok(page(data.services.catalog.by_genre(genre, req).await?))
}

pub async fn get_content(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let detail = data.services.catalog.get_detail(path.into_inner()).await?;
    Ok(ok(detail))
}

pub async fn update_content(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: web::Json<ContentDraft>,
) -> ApiResult {
    let content = data
        .services
        .catalog
        .update(path.into_inner(), payload.into_inner())
        .await?;
    Ok(ok(content))
}

pub async fn delete_content(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let content = data.services.catalog.delete(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "content deleted",
        "data": { "id": content.id },
    })))
}

/// Manual re-aggregation, used to repair a summary after a failed recompute.
pub async fn recompute_content(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let summary = data.services.lifecycle.recompute(path.into_inner()).await?;
    Ok(ok(summary))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use cr_core::{PageLimits, Services};
    use cr_store_memory::{MemoryContentRepo, MemoryRatingRepo};
    use serde_json::{json, Value};

    use super::*;
    use crate::configure_routes;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(
            Services::new(
                Arc::new(MemoryContentRepo::new()),
                Arc::new(MemoryRatingRepo::new()),
            ),
            PageLimits::default(),
        ))
    }

    fn movie(title: &str, genre: &str) -> Value {
        json!({
            "title": title,
            "year": 2010,
            "duration": 148,
            "genre": genre,
            "actors": ["Leonardo DiCaprio"],
            "description": "A thief who steals corporate secrets through dream-sharing."
        })
    }

    #[actix_web::test]
    async fn create_then_fetch_detail() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/contents")
            .set_json(movie("Inception", "Sci-Fi"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["averageRating"], 0.0);
        assert_eq!(body["data"]["totalRatings"], 0);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/contents/{id}"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["title"], "Inception");
        assert_eq!(body["data"]["recentReviews"], json!([]));
    }

    #[actix_web::test]
    async fn malformed_id_is_a_bad_request() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_routes)).await;
        let req = test::TestRequest::get()
            .uri("/api/contents/not-an-id")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn unknown_content_is_not_found() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_routes)).await;
        let req = test::TestRequest::get()
            .uri(&format!("/api/contents/{}", Uuid::now_v7()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn out_of_range_year_is_rejected() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_routes)).await;
        let mut body = movie("Inception", "Sci-Fi");
        body["year"] = json!(1800);
        let req = test::TestRequest::post()
            .uri("/api/contents")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn listing_is_paginated_and_genre_filtered() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_routes)).await;
        for (title, genre) in [("Heat", "Action"), ("Alien", "Sci-Fi"), ("Up", "Comedy")] {
            let req = test::TestRequest::post()
                .uri("/api/contents")
                .set_json(movie(title, genre))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get()
            .uri("/api/contents?page=1&limit=2&sortBy=title&sortOrder=asc")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][0]["title"], "Alien");
        assert_eq!(body["pagination"]["total"], 3);
        assert_eq!(body["pagination"]["pages"], 2);

        let req = test::TestRequest::get()
            .uri("/api/contents/genre/scifi")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["title"], "Alien");

        let req = test::TestRequest::get()
            .uri("/api/contents/genre/western")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn top_quality_rejects_out_of_range_threshold() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_routes)).await;
        let req = test::TestRequest::get()
            .uri("/api/contents/top-quality?minRating=7")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
