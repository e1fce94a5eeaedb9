//! Content CRUD. Detail edits go through here; rating summaries never do.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Content, ContentDetail, ContentDraft, Genre, RatingScope};
use crate::query::{
    ContentFilter, ContentQuery, ContentSort, ContentSortKey, PageRequest, Paginated,
};
use crate::traits::{ContentRepo, RatingRepo};
use crate::validation;

/// Number of ratings embedded in a content detail view.
pub const RECENT_REVIEWS: u32 = 5;

pub const DEFAULT_TOP_MIN_RATING: f64 = 4.5;
pub const DEFAULT_TOP_MIN_REVIEWS: u64 = 100;

pub struct CatalogService {
    contents: Arc<dyn ContentRepo>,
    ratings: Arc<dyn RatingRepo>,
}

impl CatalogService {
    pub fn new(contents: Arc<dyn ContentRepo>, ratings: Arc<dyn RatingRepo>) -> Self {
        Self { contents, ratings }
    }

    pub async fn create(&self, draft: ContentDraft) -> Result<Content> {
        let draft = validation::normalize_content(draft)?;
        let content = self.contents.create(draft).await?;
        info!(content_id = %content.id, title = %content.title, "content created");
        Ok(content)
    }

    pub async fn get(&self, id: Uuid) -> Result<Content> {
        self.contents
            .get(id)
            .await?
            .ok_or(AppError::ContentNotFound(id))
    }

    /// The content plus its few most recent ratings.
    pub async fn get_detail(&self, id: Uuid) -> Result<ContentDetail> {
        let content = self.get(id).await?;
        let recent = self
            .ratings
            .list(
                RatingScope::Content(id),
                PageRequest {
                    page: 1,
                    limit: RECENT_REVIEWS,
                },
            )
            .await?;
        Ok(ContentDetail {
            content,
            recent_reviews: recent.items,
        })
    }

    pub async fn update(&self, id: Uuid, draft: ContentDraft) -> Result<Content> {
        let draft = validation::normalize_content(draft)?;
        let content = self
            .contents
            .update_details(id, draft)
            .await?
            .ok_or(AppError::ContentNotFound(id))?;
        info!(content_id = %id, title = %content.title, "content updated");
        Ok(content)
    }

    /// Ratings of the removed content are left in place.
    pub async fn delete(&self, id: Uuid) -> Result<Content> {
        let content = self
            .contents
            .delete(id)
            .await?
            .ok_or(AppError::ContentNotFound(id))?;
        if content.total_ratings > 0 {
            warn!(
                content_id = %id,
                orphaned_ratings = content.total_ratings,
                "content deleted with ratings still attached"
            );
        }
        info!(content_id = %id, title = %content.title, "content deleted");
        Ok(content)
    }

    pub async fn list(&self, sort: ContentSort, page: PageRequest) -> Result<Paginated<Content>> {
        self.contents
            .list(ContentQuery {
                filter: ContentFilter::All,
                sort,
                page,
            })
            .await
    }

    pub async fn by_genre(&self, genre: Genre, page: PageRequest) -> Result<Paginated<Content>> {
        self.contents
            .list(ContentQuery {
                filter: ContentFilter::Genre(genre),
                sort: ContentSort::desc(ContentSortKey::AverageRating),
                page,
            })
            .await
    }

    pub async fn top_quality(
        &self,
        min_rating: Option<f64>,
        min_reviews: Option<u64>,
        page: PageRequest,
    ) -> Result<Paginated<Content>> {
        let min_rating = min_rating.unwrap_or(DEFAULT_TOP_MIN_RATING);
        if !(0.0..=5.0).contains(&min_rating) {
            return Err(AppError::validation("minRating must be between 0 and 5"));
        }
        self.contents
            .list(ContentQuery {
                filter: ContentFilter::MinSummary {
                    min_rating,
                    min_reviews: min_reviews.unwrap_or(DEFAULT_TOP_MIN_REVIEWS),
                },
                sort: ContentSort::desc(ContentSortKey::AverageRating),
                page,
            })
            .await
    }
}
