//! Read-only views over the Rating collection.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Rating, RatingDistribution, RatingScope, RatingSummary};
use crate::query::{PageRequest, Paginated};
use crate::traits::{ContentRepo, RatingRepo};

pub struct RatingQueries {
    contents: Arc<dyn ContentRepo>,
    ratings: Arc<dyn RatingRepo>,
}

impl RatingQueries {
    pub fn new(contents: Arc<dyn ContentRepo>, ratings: Arc<dyn RatingRepo>) -> Self {
        Self { contents, ratings }
    }

    pub async fn get(&self, id: Uuid) -> Result<Rating> {
        self.ratings
            .get(id)
            .await?
            .ok_or(AppError::RatingNotFound(id))
    }

    pub async fn list(&self, scope: RatingScope, page: PageRequest) -> Result<Paginated<Rating>> {
        self.ratings.list(scope, page).await
    }

    /// Star histogram for one content.
    pub async fn distribution(&self, content_id: Uuid) -> Result<RatingDistribution> {
        if !self.contents.exists(content_id).await? {
            return Err(AppError::ContentNotFound(content_id));
        }
        self.ratings
            .distribution(RatingScope::Content(content_id))
            .await
    }

    /// A user's mean and count, rounded like a content summary.
    pub async fn user_stats(&self, user_id: &str) -> Result<RatingSummary> {
        let totals = self
            .ratings
            .totals(RatingScope::User(user_id.trim().to_string()))
            .await?;
        Ok(RatingSummary::from_totals(totals))
    }
}
