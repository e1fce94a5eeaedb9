//! HTTP mapping for [`AppError`].
//!
//! Every failure leaves the API as `{"success": false, "error": "..."}`.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use cr_core::AppError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError(AppError::ValidationError(msg.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::ContentNotFound(_) | AppError::RatingNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateRating { .. } => StatusCode::CONFLICT,
            AppError::InvalidRatingValue(_) | AppError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::AggregationFailed { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
            "internal server error".to_string()
        } else {
            match &self.0 {
                AppError::ValidationError(msg) => msg.clone(),
                other => other.to_string(),
            }
        };
        HttpResponse::build(status).json(json!({
            "success": false,
            "error": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn domain_errors_map_to_statuses() {
        let id = Uuid::now_v7();
        assert_eq!(
            ApiError(AppError::ContentNotFound(id)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(AppError::DuplicateRating {
                user_id: "u1".into(),
                content_id: id,
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(AppError::InvalidRatingValue(6)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(AppError::internal("pool closed")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_details() {
        let resp = ApiError(AppError::internal("disk I/O error at /var/db")).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
