//! # Rating Lifecycle
//!
//! Owns create / update / delete of ratings. Every successful mutation is
//! followed by exactly one recompute of the affected content's summary.
//!
//! The (user, content) pre-check in [`RatingLifecycle::create`] only gives an
//! early error; the store's unique constraint is what actually decides a race
//! between two concurrent creates.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregator::RatingAggregator;
use crate::error::{AppError, Result};
use crate::models::{NewRating, Rating, RatingPatch, RatingSummary};
use crate::traits::{ContentRepo, RatingRepo};
use crate::validation;

pub struct RatingLifecycle {
    contents: Arc<dyn ContentRepo>,
    ratings: Arc<dyn RatingRepo>,
    aggregator: Arc<RatingAggregator>,
}

impl RatingLifecycle {
    pub fn new(
        contents: Arc<dyn ContentRepo>,
        ratings: Arc<dyn RatingRepo>,
        aggregator: Arc<RatingAggregator>,
    ) -> Self {
        Self {
            contents,
            ratings,
            aggregator,
        }
    }

    pub async fn create(&self, new_rating: NewRating) -> Result<Rating> {
        let new_rating = validation::normalize_new_rating(new_rating)?;

        if !self.contents.exists(new_rating.content_id).await? {
            return Err(AppError::ContentNotFound(new_rating.content_id));
        }

        if self
            .ratings
            .find_by_user_and_content(&new_rating.user_id, new_rating.content_id)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateRating {
                user_id: new_rating.user_id,
                content_id: new_rating.content_id,
            });
        }

        let rating = self.ratings.insert(new_rating).await?;
        info!(
            rating_id = %rating.id,
            user_id = %rating.user_id,
            content_id = %rating.content_id,
            value = rating.rating,
            "rating created"
        );

        self.reaggregate(rating).await
    }

    /// Only `rating` and `comment` can change; identity and `created_at` are
    /// not representable in a [`RatingPatch`].
    pub async fn update(&self, id: Uuid, patch: RatingPatch) -> Result<Rating> {
        let patch = validation::normalize_patch(patch)?;

        let rating = self
            .ratings
            .update(id, patch)
            .await?
            .ok_or(AppError::RatingNotFound(id))?;
        info!(rating_id = %id, content_id = %rating.content_id, value = rating.rating, "rating updated");

        self.reaggregate(rating).await
    }

    /// Returns the removed rating so callers know which content it belonged to.
    pub async fn delete(&self, id: Uuid) -> Result<Rating> {
        let rating = self
            .ratings
            .delete(id)
            .await?
            .ok_or(AppError::RatingNotFound(id))?;
        info!(rating_id = %id, content_id = %rating.content_id, "rating deleted");

        self.reaggregate(rating).await
    }

    /// Manual re-aggregation, e.g. after an `AggregationFailed`.
    pub async fn recompute(&self, content_id: Uuid) -> Result<RatingSummary> {
        let summary = self.aggregator.recompute(content_id).await?;
        info!(%content_id, total_ratings = summary.total_ratings, "manual recompute done");
        Ok(summary)
    }

    /// The rating mutation is already committed at this point; a failure here
    /// is reported as `AggregationFailed` and nothing is rolled back.
    async fn reaggregate(&self, rating: Rating) -> Result<Rating> {
        match self.aggregator.recompute(rating.content_id).await {
            Ok(_) => Ok(rating),
            Err(source) => {
                warn!(
                    rating_id = %rating.id,
                    content_id = %rating.content_id,
                    error = %source,
                    "rating summary is stale, manual recompute required"
                );
                Err(AppError::AggregationFailed {
                    rating: Box::new(rating),
                    source: Box::new(source),
                })
            }
        }
    }
}
