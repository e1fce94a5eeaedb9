//! # AppError
//!
//! Centralized error handling for the content-rater ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;
use uuid::Uuid;

use crate::models::Rating;

/// The primary error type for all cr-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Referenced content id does not exist
    #[error("content not found with ID {0}")]
    ContentNotFound(Uuid),

    /// Referenced rating id does not exist or was already deleted
    #[error("rating not found with ID {0}")]
    RatingNotFound(Uuid),

    /// The (user, content) pair already has a rating
    #[error("user '{user_id}' has already rated content {content_id}")]
    DuplicateRating { user_id: String, content_id: Uuid },

    /// Star value outside 1..=5
    #[error("rating must be an integer between 1 and 5, got {0}")]
    InvalidRatingValue(i64),

    /// Input shape failure (e.g., title too long, empty actor list)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The rating mutation committed but the content summary could not be
    /// recomputed. The committed rating is carried so callers can still
    /// report success and schedule a manual re-aggregation.
    #[error("rating {} saved but aggregation for content {} failed: {source}", rating.id, rating.content_id)]
    AggregationFailed {
        rating: Box<Rating>,
        #[source]
        source: Box<AppError>,
    },

    /// Infrastructure failure (e.g., DB down, pool exhausted)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }
}

/// A specialized Result type for content-rater logic.
pub type Result<T> = std::result::Result<T, AppError>;
