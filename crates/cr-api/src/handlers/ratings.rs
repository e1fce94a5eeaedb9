//! `/api/ratings` handlers.

use actix_web::{web, HttpResponse};
use cr_core::{NewRating, RatingPatch, RatingScope};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{ok, page, settle, ApiResult, AppState, PageParams};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    pub user_id: String,
    pub content_id: Uuid,
    /// Non-integer JSON numbers fail deserialization and surface as 400.
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

impl From<CreateRatingRequest> for NewRating {
    fn from(req: CreateRatingRequest) -> Self {
        NewRating {
            user_id: req.user_id,
            content_id: req.content_id,
            rating: req.rating,
            comment: req.comment,
        }
    }
}

pub async fn list_ratings(data: web::Data<AppState>, params: web::Query<PageParams>) -> ApiResult {
    let req = data.limits.request(params.page, params.limit);
    Ok(page(data.services.ratings.list(RatingScope::All, req).await?))
}

pub async fn create_rating(
    data: web::Data<AppState>,
    payload: web::Json<CreateRatingRequest>,
) -> ApiResult {
    let committed = settle(
        data.services
            .lifecycle
            .create(payload.into_inner().into())
            .await,
    )?;
    Ok(committed.into_response(HttpResponse::Created()))
}

pub async fn ratings_by_content(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    params: web::Query<PageParams>,
) -> ApiResult {
    let req = data.limits.request(params.page, params.limit);
    let scope = RatingScope::Content(path.into_inner());
    Ok(page(data.services.ratings.list(scope, req).await?))
}

pub async fn ratings_by_user(
    data: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> ApiResult {
    let req = data.limits.request(params.page, params.limit);
    let scope = RatingScope::User(path.into_inner().trim().to_string());
    Ok(page(data.services.ratings.list(scope, req).await?))
}

pub async fn user_stats(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let user_id = path.into_inner();
    let summary = data.services.ratings.user_stats(&user_id).await?;
    Ok(ok(json!({
        "userId": user_id.trim(),
        "averageRating": summary.average_rating,
        "totalRatings": summary.total_ratings,
    })))
}

pub async fn rating_distribution(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let content_id = path.into_inner();
    let distribution = data.services.ratings.distribution(content_id).await?;
    Ok(ok(json!({
        "contentId": content_id,
        "total": distribution.total(),
        "distribution": distribution,
    })))
}

pub async fn get_rating(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    Ok(ok(data.services.ratings.get(path.into_inner()).await?))
}

/// Unknown body fields (including `userId`/`contentId`) are ignored.
pub async fn update_rating(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: web::Json<RatingPatch>,
) -> ApiResult {
    let committed = settle(
        data.services
            .lifecycle
            .update(path.into_inner(), payload.into_inner())
            .await,
    )?;
    Ok(committed.into_response(HttpResponse::Ok()))
}

pub async fn delete_rating(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let committed = settle(data.services.lifecycle.delete(path.into_inner()).await)?;
    Ok(committed.into_response(HttpResponse::Ok()))
}
