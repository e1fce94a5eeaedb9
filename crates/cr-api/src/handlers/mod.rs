//! # cr-api Handlers
//!
//! Thin adapters between HTTP and the cr-core services. Successful
//! responses use the `{"success": true, "data": ...}` envelope; list
//! endpoints add a `pagination` object.

pub mod analytics;
pub mod contents;
pub mod ratings;

use actix_web::{HttpResponse, Responder};
use cr_core::{AppError, PageLimits, Paginated, Rating, Services};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub services: Services,
    pub limits: PageLimits,
}

impl AppState {
    pub fn new(services: Services, limits: PageLimits) -> Self {
        Self { services, limits }
    }
}

pub type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub(crate) fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "data": data }))
}

pub(crate) fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(json!({ "success": true, "data": data }))
}

pub(crate) fn page<T: Serialize>(page: Paginated<T>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": page.items,
        "pagination": page.pagination,
    }))
}

/// Outcome of a committed rating mutation.
pub(crate) struct Committed {
    pub rating: Rating,
    /// Set when the summary could not be refreshed.
    pub warning: Option<String>,
}

impl Committed {
    pub fn into_response(self, mut builder: actix_web::HttpResponseBuilder) -> HttpResponse {
        match self.warning {
            Some(warning) => builder.json(json!({
                "success": true,
                "data": self.rating,
                "warning": warning,
            })),
            None => builder.json(json!({ "success": true, "data": self.rating })),
        }
    }
}

/// A failed recompute after a committed write is still a success for the
/// caller. The lifecycle has already logged it; the summary is repaired by
/// the next mutation on that content or a manual recompute.
pub(crate) fn settle(result: cr_core::Result<Rating>) -> Result<Committed, ApiError> {
    match result {
        Ok(rating) => Ok(Committed {
            rating,
            warning: None,
        }),
        Err(AppError::AggregationFailed { rating, .. }) => Ok(Committed {
            warning: Some(format!(
                "rating saved, but the summary for content {} could not be refreshed",
                rating.content_id
            )),
            rating: *rating,
        }),
        Err(err) => Err(err.into()),
    }
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "content-rater",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}
